//! Error types for Recap.
//!
//! Library crates use [`RecapError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Recap operations.
#[derive(Debug, thiserror::Error)]
pub enum RecapError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Generation backend error (HTTP, API status, or response shape).
    #[error("backend error: {0}")]
    Backend(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (missing recordings, bad dates, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RecapError>;

impl RecapError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a backend error from any displayable message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = RecapError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = RecapError::backend("HTTP 429 Too Many Requests");
        assert_eq!(err.to_string(), "backend error: HTTP 429 Too Many Requests");

        let err = RecapError::validation("no .webm recordings in ./inputFiles");
        assert!(err.to_string().contains("no .webm recordings"));
    }

    #[test]
    fn io_error_carries_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = RecapError::io("/tmp/outputFiles", source);
        let text = err.to_string();
        assert!(text.contains("/tmp/outputFiles"));
        assert!(text.contains("gone"));
    }
}
