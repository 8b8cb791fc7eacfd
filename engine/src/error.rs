//! Error types for the Tirelire engine.

use thiserror::Error;

/// All possible errors from the Tirelire engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// An import document failed structural validation; nothing was
    /// applied.
    #[error("invalid import: {0}")]
    InvalidImport(String),

    /// A stored state blob could not be parsed.
    #[error("invalid stored state: {0}")]
    InvalidStoredState(String),

    /// A state could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A link code does not match the expected 6-character format.
    #[error("malformed link code: {0}")]
    MalformedLinkCode(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::InvalidImport("transactions missing".into());
        assert_eq!(err.to_string(), "invalid import: transactions missing");

        let err = Error::MalformedLinkCode("abc".into());
        assert_eq!(err.to_string(), "malformed link code: abc");
    }
}
