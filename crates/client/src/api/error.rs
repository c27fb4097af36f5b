//! Cacher API client error types.

use std::sync::Arc;

/// Errors from the cacher and loopstats feeds.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Base URL could not be parsed or cannot carry path segments.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout } else { ApiError::Network(Arc::new(err)) }
    }
}

impl From<ApiError> for pitlane_core::Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidUrl(msg) => pitlane_core::Error::InvalidInput(msg),
            ApiError::Parse(msg) => pitlane_core::Error::Parse(msg),
            other => pitlane_core::Error::HttpError(other.to_string()),
        }
    }
}
