//! Contains the error-related types for the `bson-builder` crate.

use thiserror::Error;

use crate::{builder::ScopeKind, encoder, spec::ElementType};

/// The result type for all methods that can return an error in the `bson-builder` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `bson-builder` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The nesting depth of the builder when the error occurred, if the error came from a
    /// builder operation.
    pub depth: Option<usize>,

    /// The kind of the innermost open scope when the error occurred, if the error came from a
    /// builder operation.
    pub scope: Option<ScopeKind>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "Error at key \"{key}\"")?;
        } else if self.depth.is_some() {
            write!(f, "Error")?;
        }
        match (self.depth, self.scope) {
            (Some(depth), Some(scope)) => write!(f, " (depth {depth}, in {scope}): ")?,
            (Some(depth), None) => write!(f, " (depth {depth}): ")?,
            _ if self.key.is_some() => write!(f, ": ")?,
            _ => {}
        }

        write!(f, "{}", self.kind)
    }
}

/// The types of errors that can occur in the `bson-builder` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A value was appended or a scope opened in a document without a preceding key.
    #[error("a key must be set before appending a value to a document")]
    NeedKey,

    /// A key was set while another key was still waiting for its value, or the builder was
    /// viewed, extracted or closed while a key was waiting for its value or a scope was open.
    #[error("the builder has an unmatched key or an unclosed scope")]
    UnmatchedKeyInBuilder,

    /// A key was set while the innermost open scope is an array.
    #[error("keys cannot be set in an array scope")]
    CannotSetKeyInArrayScope,

    /// A close operation did not match the kind of the innermost open scope.
    #[error("cannot close {expected} while the innermost open scope is {actual}")]
    #[non_exhaustive]
    ScopeKindMismatch {
        /// The kind of scope the caller attempted to close.
        expected: ScopeKind,

        /// The kind of the innermost open scope.
        actual: ScopeKind,
    },

    /// A close operation was attempted with no open scope.
    #[error("there is no open {kind} to close")]
    #[non_exhaustive]
    NoScopeToClose {
        /// The kind of scope the caller attempted to close.
        kind: ScopeKind,
    },

    /// A root-level operation requested the wrong root kind.
    #[error("cannot perform {requested} operation on a builder whose root is {actual}")]
    #[non_exhaustive]
    WrongRootKind {
        /// The root kind requested by the caller.
        requested: ScopeKind,

        /// The root kind the builder was constructed with.
        actual: ScopeKind,
    },

    /// The encoder failed to append a value of the given type.
    #[error("cannot append {element_type} value: {source}")]
    #[non_exhaustive]
    CannotAppend {
        /// The type of value that could not be appended.
        element_type: ElementType,

        /// The underlying encoder failure.
        source: encoder::Error,
    },

    /// The encoder failed to begin a nested scope.
    #[error("cannot begin appending {kind}: {source}")]
    #[non_exhaustive]
    CannotBeginScope {
        /// The kind of scope that could not be opened.
        kind: ScopeKind,

        /// The underlying encoder failure.
        source: encoder::Error,
    },

    /// The encoder failed to fold a nested scope into its parent.
    #[error("cannot end appending {kind}: {source}")]
    #[non_exhaustive]
    CannotEndScope {
        /// The kind of scope that could not be closed.
        kind: ScopeKind,

        /// The underlying encoder failure.
        source: encoder::Error,
    },

    /// A document could not be concatenated into the builder.
    #[error("cannot concatenate document: {message}")]
    #[non_exhaustive]
    CannotAppendDocument {
        /// A description of the failure.
        message: String,
    },

    /// Malformed BSON bytes were encountered.
    #[error("Malformed BSON: {message}")]
    #[non_exhaustive]
    MalformedBytes { message: String },

    /// Invalid UTF-8 bytes were encountered.
    #[error("Invalid UTF-8")]
    Utf8Encoding,

    /// An error related to the [`ObjectId`](crate::oid::ObjectId) type occurred.
    #[error("An ObjectId-related error occurred: {kind}")]
    #[non_exhaustive]
    ObjectId {
        /// The kind of error that occurred.
        kind: ObjectIdErrorKind,
    },

    /// An error related to the [`DateTime`](crate::DateTime) type occurred.
    #[error("A DateTime-related error occurred: {message}")]
    #[non_exhaustive]
    DateTime { message: String },
}

/// The kinds of errors that can occur when parsing an [`ObjectId`](crate::oid::ObjectId) from a
/// hex string.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ObjectIdErrorKind {
    /// An invalid character was found in the provided hex string. Valid characters are: `0...9`,
    /// `a...f`, or `A...F`.
    #[error("invalid character '{c}' encountered at index {index}")]
    #[non_exhaustive]
    InvalidHexStringCharacter {
        /// The invalid character.
        c: char,

        /// The index at which the invalid character was encountered.
        index: usize,
    },

    /// A hex string whose length is not 24 characters was encountered.
    #[error("invalid hex string length {length}")]
    #[non_exhaustive]
    InvalidHexStringLength {
        /// The length of the invalid hex string.
        length: usize,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            depth: None,
            scope: None,
        }
    }
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_context(mut self, depth: usize, scope: ScopeKind) -> Self {
        self.depth = Some(depth);
        self.scope = Some(scope);
        self
    }

    pub(crate) fn malformed_bytes(message: impl ToString) -> Self {
        ErrorKind::MalformedBytes {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn cannot_append_document(message: impl ToString) -> Self {
        ErrorKind::CannotAppendDocument {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn invalid_object_id(kind: ObjectIdErrorKind) -> Self {
        ErrorKind::ObjectId { kind }.into()
    }

    pub(crate) fn datetime(message: impl ToString) -> Self {
        ErrorKind::DateTime {
            message: message.to_string(),
        }
        .into()
    }

    /// Whether this error was caused by misuse of the builder's key/scope protocol rather than
    /// by the encoder rejecting a write.
    pub fn is_structural(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NeedKey
                | ErrorKind::UnmatchedKeyInBuilder
                | ErrorKind::CannotSetKeyInArrayScope
                | ErrorKind::ScopeKindMismatch { .. }
                | ErrorKind::NoScopeToClose { .. }
                | ErrorKind::WrongRootKind { .. }
        )
    }

    #[cfg(test)]
    pub(crate) fn is_malformed_bytes(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedBytes { .. })
    }
}
