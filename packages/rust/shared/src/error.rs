//! Error types for discusskit.
//!
//! Library crates use [`DiscusskitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all discusskit operations.
#[derive(Debug, thiserror::Error)]
pub enum DiscusskitError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Catalog metadata missing, malformed, or inconsistent.
    #[error("catalog error: {message}")]
    Catalog { message: String },

    /// Network/HTTP error while talking to the remote source.
    #[error("network error: {0}")]
    Network(String),

    /// Expected content region missing from a fetched document.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (group names, slugs, URLs).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// At least one job of a batch failed.
    #[error("batch failed: {failed} of {total} items did not complete")]
    Batch { failed: usize, total: usize },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DiscusskitError>;

impl DiscusskitError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a catalog error from any displayable message.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog {
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
