//! Storage error taxonomy
//!
//! Connectivity and driver failures on the data path are logged where they
//! happen and degrade to empty results or skipped writes; only connection
//! setup and schema creation surface these errors to the caller.

use crate::column::ColumnType;

/// Errors produced by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{backend} is not connected")]
    NotConnected { backend: &'static str },

    #[error("{backend} driver error: {message}")]
    Driver {
        backend: &'static str,
        message: String,
    },

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("mismatched keys/values lengths: {keys} keys, {values} values")]
    MismatchedKeysValues { keys: usize, values: usize },

    #[error("column type {column_type:?} is not supported by {backend}")]
    UnsupportedColumnType {
        backend: &'static str,
        column_type: ColumnType,
    },

    #[error("{backend} does not support {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
