use thiserror::Error;

/// Result alias for encoder primitives.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the [`Encoder`](super::Encoder).
///
/// Every primitive checks for these before writing, so a failed call leaves the buffer as it
/// was.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The write would make the finished document larger than the configured limit.
    #[error("encoded document would be {size} bytes, exceeding the maximum of {max}")]
    #[non_exhaustive]
    TooLarge {
        /// The size the finished document would have had.
        size: usize,

        /// The configured maximum size.
        max: usize,
    },

    /// A key, regex pattern or regex options string contained a null byte.
    #[error("{what} {value:?} contains an interior null byte")]
    #[non_exhaustive]
    InteriorNul {
        /// Which kind of string was rejected.
        what: &'static str,

        /// The rejected string.
        value: String,
    },

    /// The target handle does not identify the innermost open scope.
    #[error("scope at offset {start} is not the innermost open scope")]
    #[non_exhaustive]
    NotInnermost {
        /// The offset recorded in the rejected handle.
        start: usize,
    },

    /// An end was requested while only the root scope is open.
    #[error("no nested scope is open")]
    NoOpenScope,

    /// Bytes passed in for splicing were not a well-formed document.
    #[error("malformed source document: {message}")]
    #[non_exhaustive]
    Malformed {
        /// A description of the problem.
        message: String,
    },
}
