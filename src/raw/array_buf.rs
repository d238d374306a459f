use std::{
    borrow::{Borrow, Cow},
    ops::Deref,
};

use super::{RawArray, RawArrayIter, RawBsonRef, RawDocumentBuf, Result};

/// An owned BSON array value (akin to [`std::path::PathBuf`]), backed by a buffer of raw BSON
/// bytes. This is what [`RawBuilder::extract_array`](crate::RawBuilder::extract_array) hands back.
///
/// This type implements `Deref` to [`RawArray`], meaning that all methods on [`RawArray`] are
/// available on [`RawArrayBuf`] values as well.
#[derive(Clone, PartialEq)]
pub struct RawArrayBuf {
    inner: RawDocumentBuf,
}

impl RawArrayBuf {
    /// Constructs a new, empty [`RawArrayBuf`].
    pub fn new() -> RawArrayBuf {
        Self {
            inner: RawDocumentBuf::new(),
        }
    }

    /// Constructs a new [`RawArrayBuf`] from encoded array bytes, validating only the framing
    /// checked by [`RawDocumentBuf::from_bytes`].
    pub fn from_bytes(data: Vec<u8>) -> Result<RawArrayBuf> {
        Ok(Self {
            inner: RawDocumentBuf::from_bytes(data)?,
        })
    }

    pub(crate) fn from_raw_document_buf(doc: RawDocumentBuf) -> Self {
        Self { inner: doc }
    }

    /// Returns the contained bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_bytes()
    }
}

impl Default for RawArrayBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RawArrayBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawArrayBuf")
            .field("data", &hex::encode(self.as_bytes()))
            .finish()
    }
}

impl Deref for RawArrayBuf {
    type Target = RawArray;

    fn deref(&self) -> &Self::Target {
        RawArray::from_doc(&self.inner)
    }
}

impl AsRef<RawArray> for RawArrayBuf {
    fn as_ref(&self) -> &RawArray {
        RawArray::from_doc(&self.inner)
    }
}

impl Borrow<RawArray> for RawArrayBuf {
    fn borrow(&self) -> &RawArray {
        self.as_ref()
    }
}

impl<'a> IntoIterator for &'a RawArrayBuf {
    type IntoIter = RawArrayIter<'a>;
    type Item = Result<RawBsonRef<'a>>;

    fn into_iter(self) -> RawArrayIter<'a> {
        self.as_ref().into_iter()
    }
}

impl<'a> From<RawArrayBuf> for Cow<'a, RawArray> {
    fn from(rd: RawArrayBuf) -> Self {
        Cow::Owned(rd)
    }
}

impl<'a> From<&'a RawArrayBuf> for Cow<'a, RawArray> {
    fn from(rd: &'a RawArrayBuf) -> Self {
        Cow::Borrowed(rd.as_ref())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RawArrayBuf {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(serde_bytes::Bytes::new(self.as_bytes()), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RawArrayBuf {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = <serde_bytes::ByteBuf as serde::Deserialize>::deserialize(deserializer)?;
        RawArrayBuf::from_bytes(bytes.into_vec()).map_err(serde::de::Error::custom)
    }
}
