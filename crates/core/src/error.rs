//! Unified error types for pitlane.
//!
//! Every failure raised by the table store falls into one of the kinds in
//! [`ErrorKind`]. Serialization failures are wrapped with the path being
//! read or written, never returned as the raw Arrow/Parquet error.

use std::path::PathBuf;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input: unknown format string, missing key segment.
    Validation,
    /// An optional codec was not compiled in.
    Dependency,
    /// A table could not be encoded or decoded.
    Codec,
    /// Filesystem failure outside best-effort cleanup.
    Io,
    /// Upstream API failure.
    Network,
}

/// Unified error type for pitlane.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Format string other than `csv` or `parquet`.
    #[error("UNSUPPORTED_FORMAT: '{0}' (use 'csv' or 'parquet')")]
    UnsupportedFormat(String),

    /// A required hierarchical key segment (year, series_id, race_id) was absent.
    #[error("MISSING_SEGMENT: {0} is required for race-scoped cache entries")]
    MissingSegment(&'static str),

    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The requested table codec is not available in this build.
    #[error("MISSING_CODEC: {format} codec unavailable ({hint})")]
    MissingCodec { format: &'static str, hint: &'static str },

    /// Encoding or decoding a table failed.
    #[error("CODEC_ERROR: {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem operation failed.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error response or transport failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Upstream payload could not be decoded.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),
}

impl Error {
    /// Wrap a codec-layer failure with the file it concerned.
    pub fn codec(path: impl Into<PathBuf>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Codec { path: path.into(), source: Box::new(source) }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedFormat(_) | Error::MissingSegment(_) | Error::InvalidInput(_) => ErrorKind::Validation,
            Error::MissingCodec { .. } => ErrorKind::Dependency,
            Error::Codec { .. } => ErrorKind::Codec,
            Error::Io(_) => ErrorKind::Io,
            Error::HttpError(_) | Error::Parse(_) => ErrorKind::Network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedFormat("xlsx".to_string());
        assert!(err.to_string().contains("UNSUPPORTED_FORMAT"));
        assert!(err.to_string().contains("xlsx"));

        let err = Error::MissingSegment("race_id");
        assert!(err.to_string().contains("race_id"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::UnsupportedFormat("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::MissingSegment("year").kind(), ErrorKind::Validation);
        assert_eq!(
            Error::MissingCodec { format: "parquet", hint: "enable the parquet feature" }.kind(),
            ErrorKind::Dependency
        );
        assert_eq!(Error::HttpError("status 404".into()).kind(), ErrorKind::Network);
    }

    #[test]
    fn test_codec_error_keeps_cause() {
        let cause = std::io::Error::other("truncated footer");
        let err = Error::codec("/tmp/cache/results.parquet", cause);
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert!(err.to_string().contains("results.parquet"));
        assert!(err.source().is_some());
    }
}
