use super::{Error, RawArrayBuf, RawBsonRef, RawDocument, RawIter, Result};

/// A slice of a BSON array (akin to [`std::str`]). This can be created from a [`RawArrayBuf`],
/// from a [`RawBuilder`](crate::RawBuilder) view of an array-rooted builder, or from any type
/// that contains valid BSON array data.
///
/// An array is encoded as a document whose keys are the decimal indices `"0"`, `"1"`, ... in
/// order. Iterating yields only the values.
///
/// ```
/// use bson_builder::raw::RawArray;
///
/// let arr = RawArray::from_bytes(b"\x13\x00\x00\x00\x100\x00\x01\x00\x00\x00\x101\x00\x02\x00\x00\x00\x00")?;
/// let values: Vec<i32> = arr
///     .into_iter()
///     .map(|v| v.map(|v| v.as_i32().unwrap_or_default()))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(values, vec![1, 2]);
/// # Ok::<(), bson_builder::error::Error>(())
/// ```
#[derive(PartialEq)]
#[repr(transparent)]
pub struct RawArray {
    pub(crate) doc: RawDocument,
}

impl RawArray {
    pub(crate) fn from_doc(doc: &RawDocument) -> &RawArray {
        // SAFETY:
        //
        // Dereferencing a raw pointer requires unsafe due to the potential that the pointer is
        // null, dangling, or misaligned. We know the pointer is not null or dangling due to the
        // fact that it's created by a safe reference. Converting &RawDocument to *const
        // RawDocument will be properly aligned due to them being references to the same type,
        // and converting *const RawDocument to *const RawArray is aligned due to the fact that
        // the only field in a RawArray is a RawDocument, meaning the structs are represented
        // identically at the byte level.
        unsafe { &*(doc as *const RawDocument as *const RawArray) }
    }

    /// Constructs a new [`RawArray`], validating the same framing invariants as
    /// [`RawDocument::from_bytes`]. Keys are not checked against their positions.
    pub fn from_bytes<D: AsRef<[u8]> + ?Sized>(data: &D) -> Result<&RawArray> {
        Ok(RawArray::from_doc(RawDocument::from_bytes(data)?))
    }

    /// Gets a reference to the value at the given index.
    pub fn get(&self, index: usize) -> Result<Option<RawBsonRef<'_>>> {
        self.into_iter().nth(index).transpose()
    }

    /// Gets the number of elements in the array by walking it.
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        for value in self {
            value?;
            count += 1;
        }
        Ok(count)
    }

    /// Returns whether the array contains any elements.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }

    /// Gets a reference to the raw bytes of the [`RawArray`].
    pub fn as_bytes(&self) -> &[u8] {
        self.doc.as_bytes()
    }

    /// Gets the array as a document, with its index keys exposed.
    pub fn as_doc(&self) -> &RawDocument {
        &self.doc
    }

    /// Gets an iterator over the values of the array.
    pub fn iter(&self) -> RawArrayIter<'_> {
        self.into_iter()
    }
}

impl std::fmt::Debug for RawArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawArray")
            .field("data", &hex::encode(self.doc.as_bytes()))
            .finish()
    }
}

impl ToOwned for RawArray {
    type Owned = RawArrayBuf;

    fn to_owned(&self) -> Self::Owned {
        RawArrayBuf::from_raw_document_buf(self.doc.to_owned())
    }
}

impl<'a> TryFrom<&'a RawDocument> for &'a RawArray {
    type Error = Error;

    /// Reinterprets a document as an array after checking that its keys are `"0"`, `"1"`, ...
    fn try_from(doc: &'a RawDocument) -> Result<Self> {
        for (index, elem) in doc.iter().enumerate() {
            let elem = elem?;
            if elem.key() != index.to_string() {
                return Err(Error::malformed_bytes(format!(
                    "array key at position {} is \"{}\"",
                    index,
                    elem.key()
                )));
            }
        }
        Ok(RawArray::from_doc(doc))
    }
}

impl<'a> IntoIterator for &'a RawArray {
    type IntoIter = RawArrayIter<'a>;
    type Item = Result<RawBsonRef<'a>>;

    fn into_iter(self) -> RawArrayIter<'a> {
        RawArrayIter {
            inner: self.doc.iter(),
        }
    }
}

/// An iterator over borrowed raw BSON array values.
pub struct RawArrayIter<'a> {
    inner: RawIter<'a>,
}

impl<'a> Iterator for RawArrayIter<'a> {
    type Item = Result<RawBsonRef<'a>>;

    fn next(&mut self) -> Option<Result<RawBsonRef<'a>>> {
        match self.inner.next() {
            Some(Ok(elem)) => Some(elem.value()),
            Some(Err(e)) => Some(Err(e)),
            None => None,
        }
    }
}
