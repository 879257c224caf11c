//! Error types for the asset engine.
//!
//! Runners never abort on a single bad record or blob. Item-level failures are
//! wrapped in [`ItemFailure`](crate::models::ItemFailure) and collected on the
//! run report; only setup failures propagate out of a runner as `Err`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which external collaborator a store failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Blob,
    Record,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Blob => f.write_str("blob store"),
            StoreKind::Record => f.write_str("record store"),
        }
    }
}

/// Main error type for the asset engine.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Record not found: {record_id}")]
    NotFound { record_id: String },

    #[error("{store} {operation} failed: {message}")]
    StoreIo {
        store: StoreKind,
        operation: &'static str,
        message: String,
    },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Not supported: {feature}")]
    Unsupported { feature: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Coarse classification used when a failure is written into a run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    StoreIo,
    Validation,
    Unsupported,
    Internal,
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        AssetError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for AssetError {
    fn from(err: serde_json::Error) -> Self {
        AssetError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for AssetError {
    fn from(err: rusqlite::Error) -> Self {
        AssetError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<url::ParseError> for AssetError {
    fn from(err: url::ParseError) -> Self {
        AssetError::Validation {
            field: "url".to_string(),
            message: err.to_string(),
        }
    }
}

impl AssetError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        AssetError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a blob store failure for the named operation.
    pub fn blob(operation: &'static str, message: impl Into<String>) -> Self {
        AssetError::StoreIo {
            store: StoreKind::Blob,
            operation,
            message: message.into(),
        }
    }

    /// Create a record store failure for the named operation.
    pub fn record(operation: &'static str, message: impl Into<String>) -> Self {
        AssetError::StoreIo {
            store: StoreKind::Record,
            operation,
            message: message.into(),
        }
    }

    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssetError::NotFound { .. } => ErrorKind::NotFound,
            AssetError::StoreIo { .. } | AssetError::Database { .. } | AssetError::Io { .. } => {
                ErrorKind::StoreIo
            }
            AssetError::Validation { .. } => ErrorKind::Validation,
            AssetError::Unsupported { .. } => ErrorKind::Unsupported,
            _ => ErrorKind::Internal,
        }
    }

    /// Whether a runner should record this error against the item and move on.
    ///
    /// Configuration errors mean the run itself cannot proceed.
    pub fn is_item_level(&self) -> bool {
        !matches!(self, AssetError::Config { .. })
    }
}
