use std::{
    borrow::{Borrow, Cow},
    ops::Deref,
};

use super::{EMPTY_DOCUMENT, RawDocument, RawElement, RawIter, Result};

/// An owned BSON document (akin to [`std::path::PathBuf`]), backed by a buffer of raw BSON bytes.
/// This is what [`RawBuilder::extract_document`](crate::RawBuilder::extract_document) hands back;
/// it can also be created from a `Vec<u8>` containing encoded BSON.
///
/// This type implements `Deref` to [`RawDocument`], meaning that all methods on [`RawDocument`] are
/// available on [`RawDocumentBuf`] values as well.
///
/// ```
/// use bson_builder::raw::RawDocumentBuf;
///
/// let doc = RawDocumentBuf::from_bytes(b"\x13\x00\x00\x00\x02hi\x00\x06\x00\x00\x00y'all\x00\x00".to_vec())?;
/// let elem = doc.iter().next().unwrap()?;
/// assert_eq!(elem.key(), "hi");
/// assert_eq!(elem.value()?.as_str(), Some("y'all"));
/// # Ok::<(), bson_builder::error::Error>(())
/// ```
#[derive(Clone, PartialEq)]
pub struct RawDocumentBuf {
    data: Vec<u8>,
}

impl RawDocumentBuf {
    /// Creates a new, empty [`RawDocumentBuf`].
    pub fn new() -> RawDocumentBuf {
        Self {
            data: EMPTY_DOCUMENT.to_vec(),
        }
    }

    /// Constructs a new [`RawDocumentBuf`], validating _only_ the
    /// following invariants:
    ///   * `data` is at least five bytes long (the minimum for a valid BSON document)
    ///   * the initial four bytes of `data` accurately represent the length of the bytes as
    ///     required by the BSON spec.
    ///   * the last byte of `data` is a 0
    ///
    /// Note that the internal structure of the bytes representing the
    /// BSON elements is _not_ validated at all by this method.
    pub fn from_bytes(data: Vec<u8>) -> Result<RawDocumentBuf> {
        let _ = RawDocument::from_bytes(data.as_slice())?;
        Ok(Self { data })
    }

    pub(crate) fn from_raw_unchecked(data: Vec<u8>) -> RawDocumentBuf {
        Self { data }
    }

    /// Gets an iterator over the elements in the [`RawDocumentBuf`], which yields
    /// `Result<RawElement<'_>>`.
    pub fn iter(&self) -> RawIter<'_> {
        self.into_iter()
    }

    /// Return the contained data as a `Vec<u8>`
    ///
    /// ```
    /// use bson_builder::raw::RawDocumentBuf;
    ///
    /// let doc = RawDocumentBuf::new();
    /// assert_eq!(doc.into_bytes(), b"\x05\x00\x00\x00\x00".to_vec());
    /// ```
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Default for RawDocumentBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RawDocumentBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocumentBuf")
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}

impl<'a> From<RawDocumentBuf> for Cow<'a, RawDocument> {
    fn from(rd: RawDocumentBuf) -> Self {
        Cow::Owned(rd)
    }
}

impl<'a> From<&'a RawDocumentBuf> for Cow<'a, RawDocument> {
    fn from(rd: &'a RawDocumentBuf) -> Self {
        Cow::Borrowed(rd.as_ref())
    }
}

impl TryFrom<Vec<u8>> for RawDocumentBuf {
    type Error = crate::error::Error;

    fn try_from(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes(data)
    }
}

impl<'a> IntoIterator for &'a RawDocumentBuf {
    type IntoIter = RawIter<'a>;
    type Item = Result<RawElement<'a>>;

    fn into_iter(self) -> RawIter<'a> {
        RawIter::new(self)
    }
}

impl AsRef<RawDocument> for RawDocumentBuf {
    fn as_ref(&self) -> &RawDocument {
        RawDocument::new_unchecked(&self.data)
    }
}

impl Deref for RawDocumentBuf {
    type Target = RawDocument;

    fn deref(&self) -> &Self::Target {
        RawDocument::new_unchecked(&self.data)
    }
}

impl Borrow<RawDocument> for RawDocumentBuf {
    fn borrow(&self) -> &RawDocument {
        self.deref()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RawDocumentBuf {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(serde_bytes::Bytes::new(&self.data), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RawDocumentBuf {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = <serde_bytes::ByteBuf as serde::Deserialize>::deserialize(deserializer)?;
        RawDocumentBuf::from_bytes(bytes.into_vec()).map_err(serde::de::Error::custom)
    }
}
