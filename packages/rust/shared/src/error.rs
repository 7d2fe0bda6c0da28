//! Error types for singlehtml.
//!
//! Library crates use [`SingleHtmlError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all singlehtml operations.
#[derive(Debug, thiserror::Error)]
pub enum SingleHtmlError {
    /// No usable source document (missing, not a file, not Markdown).
    #[error("invalid input: {message}")]
    UserInput { message: String },

    /// The intermediate HTML file never became readable.
    #[error("file not produced: {path:?} was still empty after {attempts} attempts")]
    ResourceUnavailable { path: PathBuf, attempts: u32 },

    /// An image reference could not be resolved. Recovered by removing the node.
    #[error("missing reference {reference}: {reason}")]
    MissingReference { reference: String, reason: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The Markdown renderer failed to produce its intermediate file.
    #[error("render error: {0}")]
    Render(String),

    /// Network/HTTP error while building a client or fetching.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Anything else that aborts a conversion.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SingleHtmlError>;

impl SingleHtmlError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a user input error from any displayable message.
    pub fn user_input(msg: impl Into<String>) -> Self {
        Self::UserInput {
            message: msg.into(),
        }
    }

    /// Create a missing-reference error for an unresolvable image source.
    pub fn missing(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is recovered inside a conversion rather than aborting it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingReference { .. })
    }
}
