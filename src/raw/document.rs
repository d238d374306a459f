use std::borrow::Cow;

use super::{
    Error,
    MIN_BSON_DOCUMENT_SIZE,
    RawDocumentBuf,
    RawElement,
    RawIter,
    Result,
    i32_from_slice,
};

/// A slice of a BSON document (akin to [`std::str`]). This can be created from a
/// [`RawDocumentBuf`], from a [`RawBuilder`](crate::RawBuilder) view, or from any type that
/// contains valid BSON data, including static binary literals, [`Vec<u8>`](std::vec::Vec), or
/// arrays.
///
/// This is an _unsized_ type, meaning that it must always be used behind a pointer like `&`. For an
/// owned version of this type, see [`RawDocumentBuf`].
///
/// The contents are parsed during iteration rather than at creation time, so format errors can
/// surface at any point during use.
#[derive(PartialEq)]
#[repr(transparent)]
pub struct RawDocument {
    data: [u8],
}

impl RawDocument {
    /// Constructs a new [`RawDocument`], validating _only_ the
    /// following invariants:
    ///   * `data` is at least five bytes long (the minimum for a valid BSON document)
    ///   * the initial four bytes of `data` accurately represent the length of the bytes as
    ///     required by the BSON spec.
    ///   * the last byte of `data` is a 0
    ///
    /// Note that the internal structure of the bytes representing the
    /// BSON elements is _not_ validated at all by this method. If the
    /// bytes do not conform to the BSON spec, then method calls on
    /// the [`RawDocument`] will return Errors where appropriate.
    ///
    /// ```
    /// use bson_builder::raw::RawDocument;
    ///
    /// let doc = RawDocument::from_bytes(b"\x05\0\0\0\0")?;
    /// assert!(doc.is_empty());
    /// # Ok::<(), bson_builder::error::Error>(())
    /// ```
    pub fn from_bytes<D: AsRef<[u8]> + ?Sized>(data: &D) -> Result<&RawDocument> {
        let data = data.as_ref();

        if data.len() < MIN_BSON_DOCUMENT_SIZE as usize {
            return Err(Error::malformed_bytes("document too short"));
        }

        let length = i32_from_slice(data)?;

        if data.len() as i32 != length {
            return Err(Error::malformed_bytes("document length incorrect"));
        }

        if data[data.len() - 1] != 0 {
            return Err(Error::malformed_bytes("document not null-terminated"));
        }

        Ok(RawDocument::new_unchecked(data))
    }

    /// Creates a new `RawDocument` referencing the provided data slice.
    pub(crate) fn new_unchecked<D: AsRef<[u8]> + ?Sized>(data: &D) -> &RawDocument {
        // SAFETY:
        //
        // Dereferencing a raw pointer requires unsafe due to the potential that the pointer is
        // null, dangling, or misaligned. We know the pointer is not null or dangling due to the
        // fact that it's created by a safe reference. Converting &[u8] to *const [u8] will be
        // properly aligned due to them being references to the same type, and converting *const
        // [u8] to *const RawDocument is aligned due to the fact that the only field in a
        // RawDocument is a [u8] and it is #[repr(transparent)], meaning the structs are represented
        // identically at the byte level.
        unsafe { &*(data.as_ref() as *const [u8] as *const RawDocument) }
    }

    /// Gets an iterator over the elements in the [`RawDocument`] that yields
    /// `Result<RawElement<'_>>`.
    pub fn iter(&self) -> RawIter<'_> {
        RawIter::new(self)
    }

    /// Gets the first element with the given key by iterating until the key is found.
    ///
    /// Documents produced by concatenation may legally contain the same key more than once; the
    /// first occurrence wins.
    pub fn get(&self, key: impl AsRef<str>) -> Result<Option<RawElement<'_>>> {
        for result in self.iter() {
            let elem = result?;
            if key.as_ref() == elem.key() {
                return Ok(Some(elem));
            }
        }
        Ok(None)
    }

    /// Returns a reference to the contained BSON bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns whether this document contains any elements.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().len() == MIN_BSON_DOCUMENT_SIZE as usize
    }

    /// Returns the encoded element bytes, without the length prefix and trailing null byte.
    pub(crate) fn body(&self) -> &[u8] {
        &self.data[4..self.data.len() - 1]
    }

    /// Fully walks the document, failing on the first element that cannot be parsed.
    pub(crate) fn validate(&self) -> Result<()> {
        for elem in self.iter() {
            elem?.value()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocument")
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}

impl AsRef<RawDocument> for RawDocument {
    fn as_ref(&self) -> &RawDocument {
        self
    }
}

impl ToOwned for RawDocument {
    type Owned = RawDocumentBuf;

    fn to_owned(&self) -> Self::Owned {
        RawDocumentBuf::from_raw_unchecked(self.data.to_owned())
    }
}

impl<'a> From<&'a RawDocument> for Cow<'a, RawDocument> {
    fn from(rdr: &'a RawDocument) -> Self {
        Cow::Borrowed(rdr)
    }
}

impl<'a> IntoIterator for &'a RawDocument {
    type IntoIter = RawIter<'a>;
    type Item = Result<RawElement<'a>>;

    fn into_iter(self) -> RawIter<'a> {
        self.iter()
    }
}
