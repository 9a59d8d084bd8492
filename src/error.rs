//! Error types for the LYNX parser

use thiserror::Error;

/// Boxed error returned by spec resolvers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, LynxError>;

/// LYNX parser errors
#[derive(Error, Debug)]
pub enum LynxError {
    /// JSON decoding failures keep the decoder's message
    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error("You must provide a resolveSpecURL function as an option.")]
    MissingResolver,

    /// Resolver failures keep their original message
    #[error(transparent)]
    Resolution(BoxError),

    #[error("Invalid spec at {path}: {reason}")]
    InvalidSpec { path: String, reason: String },

    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_resolver_message() {
        assert_eq!(
            LynxError::MissingResolver.to_string(),
            "You must provide a resolveSpecURL function as an option."
        );
    }

    #[test]
    fn test_resolution_error_is_transparent() {
        let err = LynxError::Resolution("spec server unavailable".into());
        assert_eq!(err.to_string(), "spec server unavailable");
    }

    #[test]
    fn test_decode_error_is_transparent() {
        let source = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let message = source.to_string();
        assert_eq!(LynxError::from(source).to_string(), message);
    }
}
