//! Error types for feedcache operations

use std::fmt;
use thiserror::Error;

use crate::BackendKind;

/// The store operation an error or log event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperationKind {
    Retrieve,
    Insert,
    Delete,
}

impl fmt::Display for StoreOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Retrieve => "retrieve",
            Self::Insert => "insert",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Storage layer errors.
///
/// Backends map their native failures (I/O, decoding, transactions) into the
/// variant of the operation that failed, so callers only ever see this
/// taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Cache read failed: {reason}")]
    Read { reason: String },

    #[error("Cache write failed: {reason}")]
    Write { reason: String },

    #[error("Cache delete failed: {reason}")]
    Delete { reason: String },

    #[error("Store {operation} was interrupted before completing")]
    Interrupted { operation: StoreOperationKind },
}

impl StorageError {
    pub fn read(reason: impl fmt::Display) -> Self {
        Self::Read {
            reason: reason.to_string(),
        }
    }

    pub fn write(reason: impl fmt::Display) -> Self {
        Self::Write {
            reason: reason.to_string(),
        }
    }

    pub fn delete(reason: impl fmt::Display) -> Self {
        Self::Delete {
            reason: reason.to_string(),
        }
    }

    /// Build the error variant matching a failed operation.
    pub fn for_operation(operation: StoreOperationKind, reason: impl fmt::Display) -> Self {
        match operation {
            StoreOperationKind::Retrieve => Self::read(reason),
            StoreOperationKind::Insert => Self::write(reason),
            StoreOperationKind::Delete => Self::delete(reason),
        }
    }

    /// The operation this error was raised by.
    pub fn operation(&self) -> StoreOperationKind {
        match self {
            Self::Read { .. } => StoreOperationKind::Retrieve,
            Self::Write { .. } => StoreOperationKind::Insert,
            Self::Delete { .. } => StoreOperationKind::Delete,
            Self::Interrupted { operation } => *operation,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all feedcache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedCacheError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: BackendKind, reason: String },
}

/// Result type alias for feedcache operations.
pub type FeedCacheResult<T> = Result<T, FeedCacheError>;

// =============================================================================
// TESTS
// =============================================================================
