// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Encoder
//!
//! [`Encoder`] owns a single byte buffer holding the root document (or array) and writes nested
//! scopes into it in place. The innermost open scope always ends the buffer, trailing null byte
//! included; the terminators of its enclosing scopes are written as each child is ended. A
//! [`ScopeHandle`] names one open scope by the offset of its length prefix.
//!
//! Every primitive validates its input and the size limit before touching the buffer, so a
//! rejected call leaves the bytes exactly as they were.

mod error;

pub use self::error::{Error, Result};

use std::{fmt, mem};

use crate::{
    raw::{EMPTY_DOCUMENT, RawBsonRef, RawDocument, RawElement},
    spec::{BinarySubtype, ElementType},
};

/// The largest document the encoder will produce, as BSON lengths are signed 32-bit integers.
pub const MAX_BSON_SIZE: usize = i32::MAX as usize;

const DEFAULT_INITIAL_CAPACITY: usize = 512;

/// The largest buffer capacity reserved up front, whatever the configured initial capacity.
pub const MAX_INITIAL_CAPACITY: usize = 16 * 1024 * 1024;

/// Whether a scope is a document or an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// An embedded document, whose elements carry caller-supplied keys.
    Document,

    /// An array, whose elements are keyed `"0"`, `"1"`, ... in order.
    Array,
}

impl ScopeKind {
    /// The element type used when a scope of this kind is nested in another.
    pub fn element_type(self) -> ElementType {
        match self {
            ScopeKind::Document => ElementType::EmbeddedDocument,
            ScopeKind::Array => ElementType::Array,
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Document => f.write_str("document"),
            ScopeKind::Array => f.write_str("array"),
        }
    }
}

/// Options controlling the encoder's buffer.
///
/// ```
/// use bson_builder::encoder::EncoderOptions;
///
/// let options = EncoderOptions::default().max_size(16 * 1024 * 1024).initial_capacity(4096);
/// assert_eq!(options.get_max_size(), 16 * 1024 * 1024);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderOptions {
    max_size: usize,
    initial_capacity: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            max_size: MAX_BSON_SIZE,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl EncoderOptions {
    /// Sets the largest size in bytes the finished root document may reach. Values are clamped
    /// to the range between an empty document and [`MAX_BSON_SIZE`].
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.clamp(EMPTY_DOCUMENT.len(), MAX_BSON_SIZE);
        self
    }

    /// Sets the capacity the buffer is allocated with, both initially and after each
    /// [`Encoder::steal`]. Values above [`MAX_INITIAL_CAPACITY`] are clamped to it; the buffer
    /// still grows past that on demand up to the size limit.
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity.min(MAX_INITIAL_CAPACITY);
        self
    }

    /// The configured size limit.
    pub fn get_max_size(&self) -> usize {
        self.max_size
    }

    /// The configured initial buffer capacity.
    pub fn get_initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    fn allocate(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.initial_capacity.min(self.max_size));
        buf.extend_from_slice(&EMPTY_DOCUMENT);
        buf
    }
}

/// Identifies an open scope in an [`Encoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeHandle {
    start: usize,
    kind: ScopeKind,
}

impl ScopeHandle {
    /// The kind of the scope.
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }
}

#[derive(Debug)]
struct OpenScope {
    handle: ScopeHandle,

    /// Offset of the element's type byte in the parent.
    element_start: usize,
}

/// Writes BSON elements into one growable buffer.
#[derive(Debug)]
pub struct Encoder {
    buf: Vec<u8>,
    root: ScopeKind,
    open: Vec<OpenScope>,
    options: EncoderOptions,
}

impl Encoder {
    /// Creates an encoder holding an empty root of the given kind.
    pub fn new(root: ScopeKind, options: EncoderOptions) -> Self {
        Self {
            buf: options.allocate(),
            root,
            open: Vec::new(),
            options,
        }
    }

    /// Discards everything written and returns to an empty root, keeping the allocation.
    pub fn reinit(&mut self) {
        self.buf.clear();
        self.buf.extend_from_slice(&EMPTY_DOCUMENT);
        self.open.clear();
    }

    /// The handle of the root scope.
    pub fn root(&self) -> ScopeHandle {
        ScopeHandle {
            start: 0,
            kind: self.root,
        }
    }

    /// The number of nested scopes currently open.
    pub fn open_scopes(&self) -> usize {
        self.open.len()
    }

    /// The options the encoder was created with.
    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// The encoded bytes. These form a complete document only while no nested scope is open.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Appends `value` under `key` to the scope `target`.
    pub fn append(&mut self, target: ScopeHandle, key: &str, value: RawBsonRef<'_>) -> Result<()> {
        self.check_target(target)?;
        check_cstring("key", key)?;
        if let RawBsonRef::RegularExpression(re) = value {
            check_cstring("regex pattern", re.pattern)?;
            check_cstring("regex options", re.options)?;
        }
        self.check_room(2 + key.len() + value_len(&value))?;

        self.begin_element(value.element_type(), key);
        match value {
            RawBsonRef::Double(d) => self.buf.extend(d.to_le_bytes()),
            RawBsonRef::String(s) | RawBsonRef::JavaScriptCode(s) | RawBsonRef::Symbol(s) => {
                write_string(&mut self.buf, s)
            }
            RawBsonRef::Document(d) => self.buf.extend_from_slice(d.as_bytes()),
            RawBsonRef::Array(a) => self.buf.extend_from_slice(a.as_bytes()),
            RawBsonRef::Binary(b) => {
                write_binary_header(&mut self.buf, b.subtype, b.bytes.len());
                self.buf.extend_from_slice(b.bytes);
            }
            RawBsonRef::Boolean(b) => self.buf.push(b as u8),
            RawBsonRef::DateTime(dt) => self.buf.extend(dt.timestamp_millis().to_le_bytes()),
            RawBsonRef::DbPointer(dbp) => {
                write_string(&mut self.buf, dbp.namespace);
                self.buf.extend(dbp.id.bytes());
            }
            RawBsonRef::Decimal128(d) => self.buf.extend(d.bytes()),
            RawBsonRef::Int32(i) => self.buf.extend(i.to_le_bytes()),
            RawBsonRef::Int64(i) => self.buf.extend(i.to_le_bytes()),
            RawBsonRef::RegularExpression(re) => {
                write_cstring(&mut self.buf, re.pattern);
                write_cstring(&mut self.buf, re.options);
            }
            RawBsonRef::JavaScriptCodeWithScope(code_w_scope) => {
                let len = 4 + string_len(code_w_scope.code) + code_w_scope.scope.as_bytes().len();
                self.buf.extend((len as i32).to_le_bytes());
                write_string(&mut self.buf, code_w_scope.code);
                self.buf.extend_from_slice(code_w_scope.scope.as_bytes());
            }
            RawBsonRef::Timestamp(ts) => self.buf.extend(ts.to_le_bytes()),
            RawBsonRef::ObjectId(oid) => self.buf.extend(oid.bytes()),
            RawBsonRef::Null | RawBsonRef::Undefined | RawBsonRef::MinKey | RawBsonRef::MaxKey => {}
        }
        self.finish(target);
        Ok(())
    }

    /// Appends an element taken from another document under a new key, copying its type and
    /// value bytes verbatim.
    pub fn append_element(
        &mut self,
        target: ScopeHandle,
        key: &str,
        element: RawElement<'_>,
    ) -> Result<()> {
        self.check_target(target)?;
        check_cstring("key", key)?;
        self.check_room(2 + key.len() + element.value_bytes().len())?;

        self.begin_element(element.element_type(), key);
        self.buf.extend_from_slice(element.value_bytes());
        self.finish(target);
        Ok(())
    }

    /// Appends a binary element of `len` zeroed bytes and returns them for the caller to fill.
    pub fn append_binary_uninit(
        &mut self,
        target: ScopeHandle,
        key: &str,
        subtype: BinarySubtype,
        len: usize,
    ) -> Result<&mut [u8]> {
        self.check_target(target)?;
        check_cstring("key", key)?;
        self.check_room((2 + key.len()).saturating_add(binary_len(subtype, len)))?;

        self.begin_element(ElementType::Binary, key);
        write_binary_header(&mut self.buf, subtype, len);
        let start = self.buf.len();
        self.buf.resize(start + len, 0);
        self.finish(target);
        Ok(&mut self.buf[start..start + len])
    }

    /// Opens a nested scope of `kind` under `key` in `target`, which must be the innermost open
    /// scope. Until the returned scope is ended, `target` accepts no writes.
    pub fn begin_scope(
        &mut self,
        target: ScopeHandle,
        key: &str,
        kind: ScopeKind,
    ) -> Result<ScopeHandle> {
        self.check_target(target)?;
        check_cstring("key", key)?;
        self.check_room(2 + key.len() + EMPTY_DOCUMENT.len())?;

        let element_start = self.buf.len() - 1;
        self.begin_element(kind.element_type(), key);
        let handle = ScopeHandle {
            start: self.buf.len(),
            kind,
        };
        self.buf.extend_from_slice(&EMPTY_DOCUMENT);
        self.open.push(OpenScope {
            handle,
            element_start,
        });
        Ok(handle)
    }

    /// Closes `child`, the innermost open scope, folding it into `parent`.
    pub fn end_scope(&mut self, parent: ScopeHandle, child: ScopeHandle) -> Result<()> {
        let depth = self.open.len();
        let innermost = self.open.last().ok_or(Error::NoOpenScope)?;
        if innermost.handle != child {
            return Err(Error::NotInnermost { start: child.start });
        }
        let expected_parent = match depth {
            1 => self.root(),
            _ => self.open[depth - 2].handle,
        };
        if expected_parent != parent {
            return Err(Error::NotInnermost {
                start: parent.start,
            });
        }

        self.write_len(child.start);
        self.open.pop();
        self.finish(parent);
        Ok(())
    }

    /// Removes `child`, the innermost open scope, together with its element in the parent.
    pub fn discard_scope(&mut self, child: ScopeHandle) -> Result<()> {
        let innermost = self.open.last().ok_or(Error::NoOpenScope)?;
        if innermost.handle != child {
            return Err(Error::NotInnermost { start: child.start });
        }
        let element_start = innermost.element_start;
        self.open.pop();
        self.buf.truncate(element_start);
        let parent = self.open.last().map_or_else(|| self.root(), |s| s.handle);
        self.finish(parent);
        Ok(())
    }

    /// Splices the elements of `doc` into `target` verbatim, keys included.
    ///
    /// `doc` is fully parsed first; nothing is written if any of it is malformed.
    pub fn concat(&mut self, target: ScopeHandle, doc: &RawDocument) -> Result<()> {
        self.check_target(target)?;
        doc.validate().map_err(|e| Error::Malformed {
            message: e.to_string(),
        })?;
        let body = doc.body();
        self.check_room(body.len())?;

        self.buf.pop();
        self.buf.extend_from_slice(body);
        self.finish(target);
        Ok(())
    }

    /// Fails with [`Error::TooLarge`] unless `additional` more bytes fit under the size limit.
    pub fn check_room(&self, additional: usize) -> Result<()> {
        // every open scope still owes its parent a terminator
        let size = self
            .buf
            .len()
            .saturating_add(additional)
            .saturating_add(self.open.len());
        if size > self.options.max_size {
            return Err(Error::TooLarge {
                size,
                max: self.options.max_size,
            });
        }
        Ok(())
    }

    /// Takes the encoded root out, leaving an empty root behind.
    ///
    /// Scopes still open are dropped together with their contents, so the result is always a
    /// complete document.
    pub fn steal(&mut self) -> Vec<u8> {
        if let Some(outermost) = self.open.first() {
            self.buf.truncate(outermost.element_start);
            self.open.clear();
            self.buf.push(0);
            self.write_len(0);
        }
        mem::replace(&mut self.buf, self.options.allocate())
    }

    fn check_target(&self, target: ScopeHandle) -> Result<()> {
        let innermost = self.open.last().map(|s| s.handle).unwrap_or_else(|| self.root());
        if innermost != target {
            return Err(Error::NotInnermost {
                start: target.start,
            });
        }
        Ok(())
    }

    /// Replaces the target's trailing null byte with the element header.
    fn begin_element(&mut self, element_type: ElementType, key: &str) {
        let last = self.buf.len() - 1;
        self.buf[last] = element_type as u8;
        write_cstring(&mut self.buf, key);
    }

    fn finish(&mut self, target: ScopeHandle) {
        self.buf.push(0);
        self.write_len(target.start);
    }

    fn write_len(&mut self, start: usize) {
        let len = (self.buf.len() - start) as i32;
        self.buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
    }
}

fn check_cstring(what: &'static str, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::InteriorNul {
            what,
            value: s.to_string(),
        });
    }
    Ok(())
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend(((s.len() + 1) as i32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn write_cstring(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn write_binary_header(buf: &mut Vec<u8>, subtype: BinarySubtype, len: usize) {
    if let BinarySubtype::BinaryOld = subtype {
        buf.extend(((len + 4) as i32).to_le_bytes());
        buf.push(subtype.into());
        buf.extend((len as i32).to_le_bytes());
    } else {
        buf.extend((len as i32).to_le_bytes());
        buf.push(subtype.into());
    }
}

fn string_len(s: &str) -> usize {
    4 + s.len() + 1
}

fn binary_len(subtype: BinarySubtype, len: usize) -> usize {
    match subtype {
        BinarySubtype::BinaryOld => len.saturating_add(4 + 1 + 4),
        _ => len.saturating_add(4 + 1),
    }
}

/// The number of bytes `value` occupies after its element key.
fn value_len(value: &RawBsonRef<'_>) -> usize {
    match value {
        RawBsonRef::Double(_)
        | RawBsonRef::Int64(_)
        | RawBsonRef::DateTime(_)
        | RawBsonRef::Timestamp(_) => 8,
        RawBsonRef::Int32(_) => 4,
        RawBsonRef::Boolean(_) => 1,
        RawBsonRef::ObjectId(_) => 12,
        RawBsonRef::Decimal128(_) => 16,
        RawBsonRef::Null | RawBsonRef::Undefined | RawBsonRef::MinKey | RawBsonRef::MaxKey => 0,
        RawBsonRef::String(s) | RawBsonRef::JavaScriptCode(s) | RawBsonRef::Symbol(s) => {
            string_len(s)
        }
        RawBsonRef::Document(d) => d.as_bytes().len(),
        RawBsonRef::Array(a) => a.as_bytes().len(),
        RawBsonRef::Binary(b) => binary_len(b.subtype, b.bytes.len()),
        RawBsonRef::RegularExpression(re) => re.pattern.len() + 1 + re.options.len() + 1,
        RawBsonRef::DbPointer(dbp) => string_len(dbp.namespace) + 12,
        RawBsonRef::JavaScriptCodeWithScope(cws) => {
            4 + string_len(cws.code) + cws.scope.as_bytes().len()
        }
    }
}
