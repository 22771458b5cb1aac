//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// Default cleanup interval: one hour in milliseconds.
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding entry files and the stats sidecar
    pub cache_dir: PathBuf,
    /// Maximum total size of all entries, in bytes
    pub max_size: u64,
    /// Time-to-live for entries, in milliseconds
    pub ttl: u64,
    /// Interval between background cleanup passes, in milliseconds
    pub cleanup_interval: u64,
}

impl CacheConfig {
    /// Creates a config with the default cleanup interval.
    pub fn new(cache_dir: impl Into<PathBuf>, max_size: u64, ttl: u64) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            max_size,
            ttl,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL_MS,
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Cache directory (default: `.cache/docs`)
    /// - `CACHE_MAX_SIZE` - Maximum total size in bytes (default: 100 MiB)
    /// - `CACHE_TTL` - Entry TTL in milliseconds (default: 24 hours)
    /// - `CACHE_CLEANUP_INTERVAL` - Cleanup frequency in milliseconds (default: 1 hour)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            ttl: env::var("CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl),
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, cleanup_interval: u64) -> Self {
        self.cleanup_interval = cleanup_interval;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// The cache directory must be non-empty and the cleanup interval non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(CacheError::Config(
                "cache directory path must not be empty".to_string(),
            ));
        }
        if self.cleanup_interval == 0 {
            return Err(CacheError::Config(
                "cleanup interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache/docs"),
            max_size: 100 * 1024 * 1024,
            ttl: 24 * 60 * 60 * 1000,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL_MS,
        }
    }
}
