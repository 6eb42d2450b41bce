//! Error types shared by the generation, audio and storage layers.

use thiserror::Error;

/// Result alias for pagesong operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the pipeline components.
///
/// The variants follow the retry boundary: configuration problems are
/// surfaced immediately, transient and malformed-response failures are
/// retried, unsupported capabilities are reported as notices.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{provider} API key not configured")]
    MissingApiKey { provider: String },

    #[error("{provider} rejected the API key: {message}")]
    InvalidApiKey { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("A transformation is already in progress")]
    Busy,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Player error: {0}")]
    Player(String),
}

impl Error {
    /// Whether a failed attempt may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Api { .. } | Error::MalformedResponse(_)
        )
    }

    /// Whether this is a missing/invalid key or bad configuration.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::MissingApiKey { .. } | Error::InvalidApiKey { .. } | Error::Config(_)
        )
    }

    pub(crate) fn missing_key(provider: impl Into<String>) -> Self {
        Error::MissingApiKey {
            provider: provider.into(),
        }
    }

    /// Map an HTTP error status from `provider` into the taxonomy.
    pub(crate) fn from_status(provider: &str, status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Error::InvalidApiKey {
                provider: provider.to_string(),
                message,
            },
            _ => Error::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs can carry credentials
        Error::Network(e.without_url().to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedResponse(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_boundary() {
        assert!(Error::Network("reset".into()).is_retryable());
        assert!(Error::MalformedResponse("no candidates".into()).is_retryable());
        assert!(Error::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());

        assert!(!Error::missing_key("Gemini").is_retryable());
        assert!(!Error::Unsupported("speech".into()).is_retryable());
        assert!(!Error::Busy.is_retryable());
    }

    #[test]
    fn test_status_mapping() {
        assert!(Error::from_status("Gemini", 401, "bad key").is_config());
        assert!(Error::from_status("Gemini", 403, "forbidden").is_config());
        assert!(Error::from_status("Gemini", 500, "boom").is_retryable());
    }
}
