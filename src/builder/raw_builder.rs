use std::mem;

use tracing::{debug, trace};

use crate::{
    DateTime,
    Decimal128,
    Timestamp,
    encoder::{Encoder, EncoderOptions, ScopeHandle, ScopeKind},
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    raw::{
        RawArray,
        RawArrayBuf,
        RawBinaryRef,
        RawBsonRef,
        RawDbPointerRef,
        RawDocument,
        RawDocumentBuf,
        RawElement,
        RawJavaScriptCodeWithScopeRef,
        RawRegexRef,
    },
    spec::{BinarySubtype, ElementType},
};

/// A key for the next value appended in a document scope.
///
/// Borrowed keys must outlive the builder; owned keys are moved into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyRef<'k> {
    /// A key borrowed from the caller.
    Borrowed(&'k str),

    /// A key owned by the builder.
    Owned(String),
}

impl KeyRef<'_> {
    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            KeyRef::Borrowed(key) => key,
            KeyRef::Owned(key) => key.as_str(),
        }
    }
}

impl<'k> From<&'k str> for KeyRef<'k> {
    fn from(key: &'k str) -> Self {
        KeyRef::Borrowed(key)
    }
}

impl From<String> for KeyRef<'_> {
    fn from(key: String) -> Self {
        KeyRef::Owned(key)
    }
}

#[derive(Debug)]
enum KeyState<'k> {
    NoKey,
    Pending(KeyRef<'k>),
}

/// An open nested scope.
#[derive(Debug)]
struct Frame {
    handle: ScopeHandle,

    /// Index of the next element; only consulted in arrays.
    element_counter: usize,
}

/// The frame stack and key state of a builder, kept apart from the encoder so both can be
/// borrowed at once.
#[derive(Debug)]
struct Scopes<'k> {
    root: ScopeHandle,
    root_array_counter: usize,
    key: KeyState<'k>,
    frames: Vec<Frame>,
}

impl<'k> Scopes<'k> {
    fn new(root: ScopeHandle) -> Self {
        Self {
            root,
            root_array_counter: 0,
            key: KeyState::NoKey,
            frames: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.root_array_counter = 0;
        self.key = KeyState::NoKey;
        self.frames.clear();
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }

    fn current_kind(&self) -> ScopeKind {
        self.frames
            .last()
            .map_or(self.root.kind(), |frame| frame.handle.kind())
    }

    fn current_is_array(&self) -> bool {
        self.current_kind() == ScopeKind::Array
    }

    fn target(&self) -> ScopeHandle {
        self.frames.last().map_or(self.root, |frame| frame.handle)
    }

    fn parent_of_top(&self) -> ScopeHandle {
        match self.frames.len() {
            0 | 1 => self.root,
            n => self.frames[n - 2].handle,
        }
    }

    fn pending_key(&self) -> Option<&str> {
        match &self.key {
            KeyState::Pending(key) => Some(key.as_str()),
            KeyState::NoKey => None,
        }
    }

    fn counter(&self) -> usize {
        self.frames
            .last()
            .map_or(self.root_array_counter, |frame| frame.element_counter)
    }

    fn counter_mut(&mut self) -> &mut usize {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.element_counter,
            None => &mut self.root_array_counter,
        }
    }

    fn set_key(&mut self, key: KeyRef<'k>) -> Result<()> {
        if self.current_is_array() {
            return Err(self
                .error(ErrorKind::CannotSetKeyInArrayScope)
                .with_key(key.as_str()));
        }
        if let Some(pending) = self.pending_key() {
            return Err(self
                .error(ErrorKind::UnmatchedKeyInBuilder)
                .with_key(pending));
        }
        self.key = KeyState::Pending(key);
        Ok(())
    }

    /// Resolves the key of the next element: the next index in an array scope, the pending key
    /// in a document scope.
    fn next_key(&mut self) -> Result<KeyRef<'k>> {
        if self.current_is_array() {
            if let Some(pending) = self.pending_key() {
                return Err(self
                    .error(ErrorKind::UnmatchedKeyInBuilder)
                    .with_key(pending));
            }
            let counter = self.counter_mut();
            let key = counter.to_string();
            *counter += 1;
            return Ok(KeyRef::Owned(key));
        }

        match mem::replace(&mut self.key, KeyState::NoKey) {
            KeyState::Pending(key) => Ok(key),
            KeyState::NoKey => Err(self.error(ErrorKind::NeedKey)),
        }
    }

    /// Undoes the effect of the last `next_key` after the encoder refused the write.
    fn restore_key(&mut self, key: KeyRef<'k>) {
        if self.current_is_array() {
            *self.counter_mut() -= 1;
        } else {
            self.key = KeyState::Pending(key);
        }
    }

    fn error(&self, err: impl Into<Error>) -> Error {
        err.into().with_context(self.depth(), self.current_kind())
    }
}

/// A stack-based builder for a raw BSON document or array.
///
/// The root kind is fixed at construction. Values are appended to the innermost open scope: in
/// a document scope each value needs a key set beforehand with [`key_view`](Self::key_view) or
/// [`key_owned`](Self::key_owned); in an array scope keys are generated as `"0"`, `"1"`, ...
///
/// The builder is reusable: [`extract_document`](Self::extract_document) and
/// [`extract_array`](Self::extract_array) hand the bytes out and leave an empty root behind,
/// and [`clear`](Self::clear) discards everything.
///
/// ```
/// use bson_builder::RawBuilder;
///
/// let mut builder = RawBuilder::new_array();
/// builder.append("x")?;
/// builder.append(true)?;
/// let arr = builder.extract_array()?;
/// assert_eq!(arr.len()?, 2);
/// assert!(builder.view_array()?.is_empty());
/// # Ok::<(), bson_builder::error::Error>(())
/// ```
#[derive(Debug)]
pub struct RawBuilder<'k> {
    encoder: Encoder,
    scopes: Scopes<'k>,
}

impl Default for RawBuilder<'_> {
    fn default() -> Self {
        Self::new_document()
    }
}

impl<'k> RawBuilder<'k> {
    /// Creates a builder whose root is of the given kind.
    pub fn new(root: ScopeKind) -> Self {
        Self::with_options(root, EncoderOptions::default())
    }

    /// Creates a builder whose root is a document.
    pub fn new_document() -> Self {
        Self::new(ScopeKind::Document)
    }

    /// Creates a builder whose root is an array.
    pub fn new_array() -> Self {
        Self::new(ScopeKind::Array)
    }

    /// Creates a builder with a custom size limit or initial capacity.
    pub fn with_options(root: ScopeKind, options: EncoderOptions) -> Self {
        let encoder = Encoder::new(root, options);
        let scopes = Scopes::new(encoder.root());
        Self { encoder, scopes }
    }

    /// Sets the key of the next value, borrowing it from the caller.
    ///
    /// Fails in an array scope, and while another key is still waiting for its value.
    pub fn key_view(&mut self, key: &'k str) -> Result<()> {
        self.scopes.set_key(KeyRef::Borrowed(key))
    }

    /// Sets the key of the next value, moving it into the builder.
    ///
    /// Fails in an array scope, and while another key is still waiting for its value.
    pub fn key_owned(&mut self, key: impl Into<String>) -> Result<()> {
        self.scopes.set_key(KeyRef::Owned(key.into()))
    }

    pub(crate) fn set_key(&mut self, key: KeyRef<'k>) -> Result<()> {
        self.scopes.set_key(key)
    }

    /// Drops a pending key, if any.
    pub(crate) fn discard_key(&mut self) {
        self.scopes.key = KeyState::NoKey;
    }

    /// Removes every scope nested deeper than `depth`, contents included, as if it had never
    /// been opened.
    pub(crate) fn abandon_to(&mut self, depth: usize) {
        self.discard_key();
        while self.scopes.depth() > depth {
            let Some(frame) = self.scopes.frames.pop() else {
                break;
            };
            if let Err(source) = self.encoder.discard_scope(frame.handle) {
                // frame stack and encoder out of sync
                debug!("Cannot discard {}: {}", frame.handle.kind(), source);
                break;
            }
            if self.scopes.current_is_array() {
                *self.scopes.counter_mut() -= 1;
            }
            trace!(
                "Discarded {} at depth {}",
                frame.handle.kind(),
                self.scopes.depth() + 1
            );
        }
    }

    /// The number of nested scopes currently open.
    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    /// The kind of the root, fixed at construction.
    pub fn root_kind(&self) -> ScopeKind {
        self.scopes.root.kind()
    }

    /// Whether the innermost open scope (or the root, when none is open) is an array.
    pub fn current_is_array(&self) -> bool {
        self.scopes.current_is_array()
    }

    /// Whether the root is complete: no nested scope is open and no key is waiting.
    pub fn is_viewable(&self) -> bool {
        self.scopes.depth() == 0 && self.scopes.pending_key().is_none()
    }

    /// Appends any value. This dispatches to the matching `append_*` method.
    ///
    /// ```
    /// use bson_builder::{RawBuilder, raw::RawBsonRef};
    ///
    /// let mut builder = RawBuilder::new_document();
    /// builder.key_view("n")?;
    /// builder.append(RawBsonRef::Int64(7))?;
    /// builder.key_view("s")?;
    /// builder.append("seven")?;
    /// # Ok::<(), bson_builder::error::Error>(())
    /// ```
    pub fn append<'a>(&mut self, value: impl Into<RawBsonRef<'a>>) -> Result<()> {
        match value.into() {
            RawBsonRef::Double(d) => self.append_double(d),
            RawBsonRef::String(s) => self.append_string(s),
            RawBsonRef::Array(a) => self.append_array(a),
            RawBsonRef::Document(d) => self.append_document(d),
            RawBsonRef::Boolean(b) => self.append_bool(b),
            RawBsonRef::Null => self.append_null(),
            RawBsonRef::RegularExpression(re) => self.append_regex(re.pattern, re.options),
            RawBsonRef::JavaScriptCode(code) => self.append_javascript(code),
            RawBsonRef::JavaScriptCodeWithScope(cws) => {
                self.append_javascript_with_scope(cws.code, cws.scope)
            }
            RawBsonRef::Int32(i) => self.append_i32(i),
            RawBsonRef::Int64(i) => self.append_i64(i),
            RawBsonRef::Timestamp(ts) => self.append_timestamp(ts),
            RawBsonRef::Binary(b) => self.append_binary(b.subtype, b.bytes),
            RawBsonRef::ObjectId(oid) => self.append_object_id(oid),
            RawBsonRef::DateTime(dt) => self.append_datetime(dt),
            RawBsonRef::Symbol(s) => self.append_symbol(s),
            RawBsonRef::Decimal128(d) => self.append_decimal128(d),
            RawBsonRef::Undefined => self.append_undefined(),
            RawBsonRef::MaxKey => self.append_max_key(),
            RawBsonRef::MinKey => self.append_min_key(),
            RawBsonRef::DbPointer(dbp) => self.append_db_pointer(dbp.namespace, dbp.id),
        }
    }

    /// Appends a 64-bit float.
    pub fn append_double(&mut self, value: f64) -> Result<()> {
        self.append_value(RawBsonRef::Double(value))
    }

    /// Appends a UTF-8 string.
    pub fn append_string(&mut self, value: &str) -> Result<()> {
        self.append_value(RawBsonRef::String(value))
    }

    /// Appends an already encoded document as an embedded document.
    pub fn append_document(&mut self, value: &RawDocument) -> Result<()> {
        self.append_value(RawBsonRef::Document(value))
    }

    /// Appends an already encoded array.
    pub fn append_array(&mut self, value: &RawArray) -> Result<()> {
        self.append_value(RawBsonRef::Array(value))
    }

    /// Appends binary data with the given subtype.
    pub fn append_binary(&mut self, subtype: BinarySubtype, bytes: &[u8]) -> Result<()> {
        self.append_value(RawBsonRef::Binary(RawBinaryRef { subtype, bytes }))
    }

    /// Appends a binary value of `len` zeroed bytes and returns them to be filled in place.
    ///
    /// ```
    /// use bson_builder::{RawBuilder, spec::BinarySubtype};
    ///
    /// let mut builder = RawBuilder::new_document();
    /// builder.key_view("payload")?;
    /// builder
    ///     .append_binary_uninit(BinarySubtype::Generic, 4)?
    ///     .copy_from_slice(b"\xde\xad\xbe\xef");
    ///
    /// let doc = builder.view_document()?;
    /// let bin = doc.get("payload")?.unwrap().value()?.as_binary().unwrap();
    /// assert_eq!(bin.bytes, b"\xde\xad\xbe\xef");
    /// # Ok::<(), bson_builder::error::Error>(())
    /// ```
    pub fn append_binary_uninit(&mut self, subtype: BinarySubtype, len: usize) -> Result<&mut [u8]> {
        let key = self.scopes.next_key()?;
        let target = self.scopes.target();
        match self
            .encoder
            .append_binary_uninit(target, key.as_str(), subtype, len)
        {
            Ok(bytes) => Ok(bytes),
            Err(source) => {
                debug!("Rejected binary value at key {:?}: {}", key.as_str(), source);
                let err = self
                    .scopes
                    .error(ErrorKind::CannotAppend {
                        element_type: ElementType::Binary,
                        source,
                    })
                    .with_key(key.as_str());
                self.scopes.restore_key(key);
                Err(err)
            }
        }
    }

    /// Appends the deprecated undefined value.
    pub fn append_undefined(&mut self) -> Result<()> {
        self.append_value(RawBsonRef::Undefined)
    }

    /// Appends an [`ObjectId`].
    pub fn append_object_id(&mut self, value: ObjectId) -> Result<()> {
        self.append_value(RawBsonRef::ObjectId(value))
    }

    /// Appends a boolean.
    pub fn append_bool(&mut self, value: bool) -> Result<()> {
        self.append_value(RawBsonRef::Boolean(value))
    }

    /// Appends a UTC datetime.
    pub fn append_datetime(&mut self, value: DateTime) -> Result<()> {
        self.append_value(RawBsonRef::DateTime(value))
    }

    /// Appends null.
    pub fn append_null(&mut self) -> Result<()> {
        self.append_value(RawBsonRef::Null)
    }

    /// Appends a regular expression. Neither string may contain a null byte.
    pub fn append_regex(&mut self, pattern: &str, options: &str) -> Result<()> {
        self.append_value(RawBsonRef::RegularExpression(RawRegexRef { pattern, options }))
    }

    /// Appends a deprecated DB pointer.
    pub fn append_db_pointer(&mut self, namespace: &str, id: ObjectId) -> Result<()> {
        self.append_value(RawBsonRef::DbPointer(RawDbPointerRef { namespace, id }))
    }

    /// Appends JavaScript code.
    pub fn append_javascript(&mut self, code: &str) -> Result<()> {
        self.append_value(RawBsonRef::JavaScriptCode(code))
    }

    /// Appends a deprecated symbol.
    pub fn append_symbol(&mut self, symbol: &str) -> Result<()> {
        self.append_value(RawBsonRef::Symbol(symbol))
    }

    /// Appends JavaScript code along with the document of its variable bindings.
    pub fn append_javascript_with_scope(&mut self, code: &str, scope: &RawDocument) -> Result<()> {
        self.append_value(RawBsonRef::JavaScriptCodeWithScope(
            RawJavaScriptCodeWithScopeRef { code, scope },
        ))
    }

    /// Appends a 32-bit integer.
    pub fn append_i32(&mut self, value: i32) -> Result<()> {
        self.append_value(RawBsonRef::Int32(value))
    }

    /// Appends a [`Timestamp`].
    pub fn append_timestamp(&mut self, value: Timestamp) -> Result<()> {
        self.append_value(RawBsonRef::Timestamp(value))
    }

    /// Appends a 64-bit integer.
    pub fn append_i64(&mut self, value: i64) -> Result<()> {
        self.append_value(RawBsonRef::Int64(value))
    }

    /// Appends a [`Decimal128`].
    pub fn append_decimal128(&mut self, value: Decimal128) -> Result<()> {
        self.append_value(RawBsonRef::Decimal128(value))
    }

    /// Appends the min key.
    pub fn append_min_key(&mut self) -> Result<()> {
        self.append_value(RawBsonRef::MinKey)
    }

    /// Appends the max key.
    pub fn append_max_key(&mut self) -> Result<()> {
        self.append_value(RawBsonRef::MaxKey)
    }

    fn append_value(&mut self, value: RawBsonRef<'_>) -> Result<()> {
        let key = self.scopes.next_key()?;
        let target = self.scopes.target();
        match self.encoder.append(target, key.as_str(), value) {
            Ok(()) => Ok(()),
            Err(source) => {
                let element_type = value.element_type();
                debug!(
                    "Rejected {} value at key {:?}: {}",
                    element_type,
                    key.as_str(),
                    source
                );
                let err = self
                    .scopes
                    .error(ErrorKind::CannotAppend {
                        element_type,
                        source,
                    })
                    .with_key(key.as_str());
                self.scopes.restore_key(key);
                Err(err)
            }
        }
    }

    /// Opens a nested document under the pending key (or the next index in an array).
    pub fn open_document(&mut self) -> Result<()> {
        self.open(ScopeKind::Document)
    }

    /// Opens a nested array under the pending key (or the next index in an array).
    pub fn open_array(&mut self) -> Result<()> {
        self.open(ScopeKind::Array)
    }

    /// Closes the innermost open scope, which must be a document.
    pub fn close_document(&mut self) -> Result<()> {
        self.close(ScopeKind::Document)
    }

    /// Closes the innermost open scope, which must be an array.
    pub fn close_array(&mut self) -> Result<()> {
        self.close(ScopeKind::Array)
    }

    pub(crate) fn open(&mut self, kind: ScopeKind) -> Result<()> {
        let key = self.scopes.next_key()?;
        let target = self.scopes.target();
        match self.encoder.begin_scope(target, key.as_str(), kind) {
            Ok(handle) => {
                self.scopes.frames.push(Frame {
                    handle,
                    element_counter: 0,
                });
                trace!(
                    "Opened {} {:?} at depth {}",
                    kind,
                    key.as_str(),
                    self.scopes.depth()
                );
                Ok(())
            }
            Err(source) => {
                debug!("Cannot open {} at key {:?}: {}", kind, key.as_str(), source);
                let err = self
                    .scopes
                    .error(ErrorKind::CannotBeginScope { kind, source })
                    .with_key(key.as_str());
                self.scopes.restore_key(key);
                Err(err)
            }
        }
    }

    pub(crate) fn close(&mut self, kind: ScopeKind) -> Result<()> {
        let Some(top) = self.scopes.frames.last() else {
            return Err(self.scopes.error(ErrorKind::NoScopeToClose { kind }));
        };
        let actual = top.handle.kind();
        if actual != kind {
            return Err(self.scopes.error(ErrorKind::ScopeKindMismatch {
                expected: kind,
                actual,
            }));
        }
        if let Some(pending) = self.scopes.pending_key() {
            return Err(self
                .scopes
                .error(ErrorKind::UnmatchedKeyInBuilder)
                .with_key(pending));
        }

        let child = top.handle;
        let parent = self.scopes.parent_of_top();
        if let Err(source) = self.encoder.end_scope(parent, child) {
            debug!("Cannot close {}: {}", kind, source);
            return Err(self
                .scopes
                .error(ErrorKind::CannotEndScope { kind, source }));
        }
        self.scopes.frames.pop();
        trace!("Closed {} at depth {}", kind, self.scopes.depth() + 1);
        Ok(())
    }

    /// Splices the elements of `doc` into the innermost open scope.
    ///
    /// In a document scope the elements are copied verbatim, keys included; keys already present
    /// are not deduplicated. In an array scope each element is re-keyed with the next index and
    /// its value copied with its type unchanged. A pending key is left untouched.
    ///
    /// `doc` is fully parsed before anything is written.
    pub fn concatenate(&mut self, doc: &RawDocument) -> Result<()> {
        let target = self.scopes.target();
        if !self.scopes.current_is_array() {
            return self.encoder.concat(target, doc).map_err(|source| {
                debug!("Cannot concatenate document: {}", source);
                self.scopes.error(Error::cannot_append_document(source))
            });
        }

        let elements = doc
            .iter()
            .map(|elem| {
                let elem = elem?;
                elem.value()?;
                Ok(elem)
            })
            .collect::<Result<Vec<RawElement<'_>>>>()
            .map_err(|e| {
                self.scopes.error(Error::cannot_append_document(e))
            })?;

        let first = self.scopes.counter();
        let needed: usize = elements
            .iter()
            .enumerate()
            .map(|(i, elem)| 2 + (first + i).to_string().len() + elem.value_bytes().len())
            .sum();
        self.encoder.check_room(needed).map_err(|source| {
            debug!("Cannot concatenate {} elements: {}", elements.len(), source);
            self.scopes.error(Error::cannot_append_document(source))
        })?;

        for elem in elements {
            let key = self.scopes.next_key()?;
            self.encoder
                .append_element(target, key.as_str(), elem)
                .map_err(|source| {
                    self.scopes.error(Error::cannot_append_document(source))
                })?;
        }
        Ok(())
    }

    /// Borrows the finished root document.
    ///
    /// Fails with [`ErrorKind::UnmatchedKeyInBuilder`] while a scope is open or a key is
    /// waiting, and with [`ErrorKind::WrongRootKind`] if the root is an array.
    pub fn view_document(&self) -> Result<&RawDocument> {
        self.check_root(ScopeKind::Document)?;
        Ok(RawDocument::new_unchecked(self.encoder.as_bytes()))
    }

    /// Borrows the finished root array. Fails like [`view_document`](Self::view_document).
    pub fn view_array(&self) -> Result<&RawArray> {
        self.check_root(ScopeKind::Array)?;
        Ok(RawArray::from_doc(RawDocument::new_unchecked(
            self.encoder.as_bytes(),
        )))
    }

    /// Takes the finished root document, leaving an empty document root behind.
    pub fn extract_document(&mut self) -> Result<RawDocumentBuf> {
        self.check_root(ScopeKind::Document)?;
        Ok(RawDocumentBuf::from_raw_unchecked(self.steal()))
    }

    /// Takes the finished root array, leaving an empty array root behind.
    pub fn extract_array(&mut self) -> Result<RawArrayBuf> {
        self.check_root(ScopeKind::Array)?;
        Ok(RawArrayBuf::from_raw_document_buf(
            RawDocumentBuf::from_raw_unchecked(self.steal()),
        ))
    }

    /// Discards everything, including open scopes and a pending key.
    pub fn clear(&mut self) {
        self.encoder.reinit();
        self.scopes.reset();
        trace!("Cleared {} builder", self.root_kind());
    }

    fn check_root(&self, requested: ScopeKind) -> Result<()> {
        if !self.is_viewable() {
            let err = self.scopes.error(ErrorKind::UnmatchedKeyInBuilder);
            return Err(match self.scopes.pending_key() {
                Some(key) => err.with_key(key),
                None => err,
            });
        }
        let actual = self.root_kind();
        if actual != requested {
            return Err(self
                .scopes
                .error(ErrorKind::WrongRootKind { requested, actual }));
        }
        Ok(())
    }

    fn steal(&mut self) -> Vec<u8> {
        let bytes = self.encoder.steal();
        self.scopes.reset();
        trace!("Extracted {} of {} bytes", self.root_kind(), bytes.len());
        bytes
    }
}
