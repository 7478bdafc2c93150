use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::mcp::SyncFormat;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing required input, unsupported scope, unknown strategy.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Content that does not parse as its declared format.
    #[error("Invalid {format} content: {message}")]
    Format { format: SyncFormat, message: String },

    /// Operation refused because it would break the single-active-set invariant.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    IoContext {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },
}

impl AppError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn format(format: SyncFormat, msg: impl Into<String>) -> Self {
        Self::Format {
            format,
            message: msg.into(),
        }
    }
}
