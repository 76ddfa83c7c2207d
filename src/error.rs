//! Error types for index construction, lookup and viewer dispatch.
//!
//! `Config` and the `Tool*` variants are fatal for the current operation and are
//! shown to the user as-is. `NotFound` is an ordinary negative answer to a query.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    /// No document configured, or the configured document does not exist.
    #[error("configuration error: {0}")]
    Config(String),

    /// The text extraction binary could not be started.
    #[error("text extraction tool `{tool}` not found (install poppler-utils or set X86_LOOKUP_PDFTOTEXT)")]
    ToolMissing { tool: String },

    #[error("text extraction tool `{tool}` failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("text extraction tool `{tool}` timed out after {timeout:?}")]
    ToolTimeout { tool: String, timeout: Duration },

    #[error("no entry for mnemonic `{0}`")]
    NotFound(String),

    /// Every attempted viewer backend failed.
    #[error("no PDF viewer could be launched (tried: {})", .attempted.join(", "))]
    ViewerUnavailable { attempted: Vec<String> },

    #[error("invalid expansion rule `{pattern}`: {reason}")]
    InvalidRule { pattern: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
