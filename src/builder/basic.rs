//! Closure-based builders for documents and arrays.
//!
//! These wrap a [`RawBuilder`] so that keys and values travel together and every nested scope
//! is closed by construction:
//!
//! ```
//! use bson_builder::builder::basic::DocumentBuilder;
//!
//! let mut doc = DocumentBuilder::new();
//! doc.append("name", "widget")?
//!     .append_array("sizes", |arr| {
//!         arr.append(1)?.append(2)?;
//!         Ok(())
//!     })?
//!     .append_document("dims", |sub| {
//!         sub.append("w", 3.5)?;
//!         Ok(())
//!     })?;
//!
//! let doc = doc.extract()?;
//! assert_eq!(doc.get("name")?.unwrap().value()?.as_str(), Some("widget"));
//! # Ok::<(), bson_builder::error::Error>(())
//! ```
//!
//! If a closure returns an error, the scope it was filling is removed again, so the enclosing
//! builder is left as it was before the call.

use super::{KeyRef, RawBuilder, ScopeKind};
use crate::{
    encoder::EncoderOptions,
    error::Result,
    raw::{RawArray, RawArrayBuf, RawBsonRef, RawDocument, RawDocumentBuf},
};

fn append_pair<'a, 'k>(
    builder: &mut RawBuilder<'k>,
    key: KeyRef<'k>,
    value: RawBsonRef<'a>,
) -> Result<()> {
    builder.set_key(key)?;
    builder.append(value).inspect_err(|_| builder.discard_key())
}

fn nest<'k>(
    builder: &mut RawBuilder<'k>,
    key: Option<KeyRef<'k>>,
    kind: ScopeKind,
    fill: impl FnOnce(&mut RawBuilder<'k>) -> Result<()>,
) -> Result<()> {
    let depth = builder.depth();
    if let Some(key) = key {
        builder.set_key(key)?;
    }
    if let Err(e) = builder.open(kind) {
        builder.discard_key();
        return Err(e);
    }
    let result = fill(builder).and_then(|()| builder.close(kind));
    if result.is_err() {
        builder.abandon_to(depth);
    }
    result
}

/// A document being filled inside [`DocumentBuilder::append_document`] or one of its siblings.
pub struct SubDocument<'b, 'k> {
    builder: &'b mut RawBuilder<'k>,
}

impl<'k> SubDocument<'_, 'k> {
    /// Appends `value` under `key`.
    pub fn append<'a>(
        &mut self,
        key: impl Into<KeyRef<'k>>,
        value: impl Into<RawBsonRef<'a>>,
    ) -> Result<&mut Self> {
        append_pair(self.builder, key.into(), value.into())?;
        Ok(self)
    }

    /// Appends a nested document under `key`, filled by `fill`.
    pub fn append_document<F>(&mut self, key: impl Into<KeyRef<'k>>, fill: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubDocument<'_, 'k>) -> Result<()>,
    {
        nest(self.builder, Some(key.into()), ScopeKind::Document, |builder| {
            fill(&mut SubDocument { builder })
        })?;
        Ok(self)
    }

    /// Appends a nested array under `key`, filled by `fill`.
    pub fn append_array<F>(&mut self, key: impl Into<KeyRef<'k>>, fill: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubArray<'_, 'k>) -> Result<()>,
    {
        nest(self.builder, Some(key.into()), ScopeKind::Array, |builder| {
            fill(&mut SubArray { builder })
        })?;
        Ok(self)
    }

    /// Copies the elements of `doc` in, keys included.
    pub fn concatenate(&mut self, doc: &RawDocument) -> Result<&mut Self> {
        self.builder.concatenate(doc)?;
        Ok(self)
    }
}

/// An array being filled inside [`ArrayBuilder::append_array`] or one of its siblings.
pub struct SubArray<'b, 'k> {
    builder: &'b mut RawBuilder<'k>,
}

impl<'k> SubArray<'_, 'k> {
    /// Appends `value` at the next index.
    pub fn append<'a>(&mut self, value: impl Into<RawBsonRef<'a>>) -> Result<&mut Self> {
        self.builder.append(value)?;
        Ok(self)
    }

    /// Appends a nested document at the next index, filled by `fill`.
    pub fn append_document<F>(&mut self, fill: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubDocument<'_, 'k>) -> Result<()>,
    {
        nest(self.builder, None, ScopeKind::Document, |builder| {
            fill(&mut SubDocument { builder })
        })?;
        Ok(self)
    }

    /// Appends a nested array at the next index, filled by `fill`.
    pub fn append_array<F>(&mut self, fill: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubArray<'_, 'k>) -> Result<()>,
    {
        nest(self.builder, None, ScopeKind::Array, |builder| {
            fill(&mut SubArray { builder })
        })?;
        Ok(self)
    }

    /// Copies the values of `doc` in, each under the next index.
    pub fn concatenate(&mut self, doc: &RawDocument) -> Result<&mut Self> {
        self.builder.concatenate(doc)?;
        Ok(self)
    }
}

/// Builds a document from key/value pairs.
#[derive(Debug)]
pub struct DocumentBuilder<'k> {
    builder: RawBuilder<'k>,
}

impl Default for DocumentBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'k> DocumentBuilder<'k> {
    /// Creates an empty document builder.
    pub fn new() -> Self {
        Self::with_options(EncoderOptions::default())
    }

    /// Creates an empty document builder with the given encoder options.
    pub fn with_options(options: EncoderOptions) -> Self {
        Self {
            builder: RawBuilder::with_options(ScopeKind::Document, options),
        }
    }

    fn root(&mut self) -> SubDocument<'_, 'k> {
        SubDocument {
            builder: &mut self.builder,
        }
    }

    /// Appends `value` under `key`.
    pub fn append<'a>(
        &mut self,
        key: impl Into<KeyRef<'k>>,
        value: impl Into<RawBsonRef<'a>>,
    ) -> Result<&mut Self> {
        self.root().append(key, value)?;
        Ok(self)
    }

    /// Appends a nested document under `key`, filled by `fill`.
    pub fn append_document<F>(&mut self, key: impl Into<KeyRef<'k>>, fill: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubDocument<'_, 'k>) -> Result<()>,
    {
        self.root().append_document(key, fill)?;
        Ok(self)
    }

    /// Appends a nested array under `key`, filled by `fill`.
    pub fn append_array<F>(&mut self, key: impl Into<KeyRef<'k>>, fill: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubArray<'_, 'k>) -> Result<()>,
    {
        self.root().append_array(key, fill)?;
        Ok(self)
    }

    /// Copies the elements of `doc` in, keys included.
    pub fn concatenate(&mut self, doc: &RawDocument) -> Result<&mut Self> {
        self.root().concatenate(doc)?;
        Ok(self)
    }

    /// Borrows the document built so far.
    pub fn view(&self) -> Result<&RawDocument> {
        self.builder.view_document()
    }

    /// Takes the document built so far, leaving this builder empty.
    pub fn extract(&mut self) -> Result<RawDocumentBuf> {
        self.builder.extract_document()
    }

    /// Discards the document built so far.
    pub fn clear(&mut self) {
        self.builder.clear()
    }
}

/// Builds an array from values.
#[derive(Debug)]
pub struct ArrayBuilder<'k> {
    builder: RawBuilder<'k>,
}

impl Default for ArrayBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'k> ArrayBuilder<'k> {
    /// Creates an empty array builder.
    pub fn new() -> Self {
        Self::with_options(EncoderOptions::default())
    }

    /// Creates an empty array builder with the given encoder options.
    pub fn with_options(options: EncoderOptions) -> Self {
        Self {
            builder: RawBuilder::with_options(ScopeKind::Array, options),
        }
    }

    fn root(&mut self) -> SubArray<'_, 'k> {
        SubArray {
            builder: &mut self.builder,
        }
    }

    /// Appends `value` at the next index.
    pub fn append<'a>(&mut self, value: impl Into<RawBsonRef<'a>>) -> Result<&mut Self> {
        self.root().append(value)?;
        Ok(self)
    }

    /// Appends a nested document at the next index, filled by `fill`.
    pub fn append_document<F>(&mut self, fill: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubDocument<'_, 'k>) -> Result<()>,
    {
        self.root().append_document(fill)?;
        Ok(self)
    }

    /// Appends a nested array at the next index, filled by `fill`.
    pub fn append_array<F>(&mut self, fill: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SubArray<'_, 'k>) -> Result<()>,
    {
        self.root().append_array(fill)?;
        Ok(self)
    }

    /// Copies the values of `doc` in, each under the next index.
    pub fn concatenate(&mut self, doc: &RawDocument) -> Result<&mut Self> {
        self.root().concatenate(doc)?;
        Ok(self)
    }

    /// Borrows the array built so far.
    pub fn view(&self) -> Result<&RawArray> {
        self.builder.view_array()
    }

    /// Takes the array built so far, leaving this builder empty.
    pub fn extract(&mut self) -> Result<RawArrayBuf> {
        self.builder.extract_array()
    }

    /// Discards the array built so far.
    pub fn clear(&mut self) {
        self.builder.clear()
    }
}
