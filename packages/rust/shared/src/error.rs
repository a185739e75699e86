//! Error types for tenderlens.
//!
//! Library crates use [`TenderlensError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Extraction itself never fails: empty or unexpected pages are reported as
//! diagnostics on the result. Errors here belong to configuration, the page
//! session, and the pipeline around the extractor.

use std::path::PathBuf;

/// Top-level error type for all tenderlens operations.
#[derive(Debug, thiserror::Error)]
pub enum TenderlensError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while rendering a page or harvesting cookies.
    #[error("network error: {0}")]
    Network(String),

    /// Schema document or URL parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A site schema failed validation (duplicate fields, unknown primary, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// No schema is registered under the requested site id.
    #[error("unknown site '{0}'")]
    UnknownSite(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TenderlensError>;

impl TenderlensError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
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
        let err = TenderlensError::config("missing [session] table");
        assert_eq!(err.to_string(), "config error: missing [session] table");

        let err = TenderlensError::validation("field 'title' declared twice");
        assert!(err.to_string().contains("declared twice"));

        let err = TenderlensError::UnknownSite("texas".into());
        assert_eq!(err.to_string(), "unknown site 'texas'");
    }
}
