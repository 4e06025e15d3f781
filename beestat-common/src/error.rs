use thiserror::Error;

/// Common error type for beestat exporter components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required field is absent, has the wrong shape, or a sequence that
    /// must be non-empty is empty.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl Error {
    /// Create a malformed payload error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Returns true if this error describes an upstream data-contract violation.
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self, Self::MalformedPayload(_))
    }
}

/// Result type alias using the common [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
