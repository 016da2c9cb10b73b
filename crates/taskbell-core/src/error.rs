//! Core error types for taskbell-core.
//!
//! Store failures carry the offending path so callers can report which
//! collection file was involved. Malformed task data is deliberately *not*
//! an error anywhere in the engine: an invalid `time` makes the task inert
//! (see [`crate::schedule::anchor_time`]).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taskbell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Referenced task id does not exist
    #[error("Task not found: {id}")]
    TaskNotFound { id: String },
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create the data directory
    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a collection file
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to stage or commit a collection file
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a collection before writing
    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
