//! Cache Entry Module
//!
//! Defines the on-disk shape of a single cache entry and the expiry rule
//! shared by lazy reads and cleanup passes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::ENTRY_EXTENSION;
use crate::error::Result;

// == Cache Entry ==
/// A single cached payload as stored in `<sanitized-key>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored payload
    pub data: Value,
    /// Creation timestamp (Unix milliseconds), never updated on read
    pub timestamp: u64,
    /// Byte length of the serialized payload
    pub size: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Builds an entry from any serializable value.
    ///
    /// `size` is the length of the compact JSON encoding of `value`.
    pub fn from_value<T: Serialize + ?Sized>(value: &T, now_ms: u64) -> Result<Self> {
        let data = serde_json::to_value(value)?;
        let size = serde_json::to_vec(&data)?.len() as u64;

        Ok(Self {
            data,
            timestamp: now_ms,
            size,
        })
    }

    // == Is Expired ==
    /// Checks the entry against `ttl_ms` at time `now_ms`.
    pub fn is_expired(&self, ttl_ms: u64, now_ms: u64) -> bool {
        is_expired(self.timestamp, ttl_ms, now_ms)
    }

    /// Parses an entry file's contents.
    pub fn parse(contents: &str) -> Option<Self> {
        serde_json::from_str(contents).ok()
    }
}

/// Expiry predicate: an entry is expired once strictly more than `ttl_ms`
/// has elapsed since `timestamp`.
///
/// A timestamp in the future (clock moved backwards) is never expired.
pub fn is_expired(timestamp: u64, ttl_ms: u64, now_ms: u64) -> bool {
    now_ms.saturating_sub(timestamp) > ttl_ms
}

/// Maps a cache key to its file name.
///
/// Every character outside `[a-zA-Z0-9]` becomes `_`, so distinct keys such as
/// `a/b` and `a.b` share one file.
pub fn entry_file_name(key: &str) -> String {
    format!("{}.{}", sanitize_key(key), ENTRY_EXTENSION)
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
