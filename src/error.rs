//! Error types for the disk cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the disk cache.
///
/// Reads never surface these; `get` degrades every failure to a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid configuration, or an operation on a closed manager
    #[error("Configuration error: {0}")]
    Config(String),

    /// Directory creation or startup reconciliation failed
    #[error("Failed to initialize cache at {path}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single payload is larger than the whole cache budget
    #[error("Entry '{key}' is {size} bytes, exceeding the maximum cache size of {max_size} bytes")]
    EntryTooLarge { key: String, size: u64, max_size: u64 },

    /// Writing an entry failed
    #[error("Failed to set cache entry '{key}': {source}")]
    Set {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Removing an entry failed
    #[error("Failed to delete cache entry '{key}': {source}")]
    Delete {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Wiping the cache directory failed
    #[error("Failed to clear cache at {path}: {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A cleanup pass failed before completing
    #[error("Cache cleanup failed at {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Stat-ing the cache directory failed
    #[error("Failed to read cache directory info for {path}: {source}")]
    Info {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The payload could not be serialized to JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The blocking worker running a filesystem operation panicked or was cancelled
    #[error("Cache worker failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::Worker(format!("spawn_blocking failed: {}", err))
    }
}

impl CacheError {
    /// Error returned by operations invoked after `close()`.
    pub(crate) fn closed() -> Self {
        CacheError::Config("cache manager is closed".to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the disk cache.
pub type Result<T> = std::result::Result<T, CacheError>;
