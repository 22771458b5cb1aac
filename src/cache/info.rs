//! Directory Info Module
//!
//! Point-in-time description of the cache directory itself.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot returned by `directory_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryInfo {
    /// Configured cache directory
    pub path: PathBuf,
    /// Whether the directory exists
    pub exists: bool,
    /// Whether any write permission bit is set on the directory.
    ///
    /// Reflects mode bits only; ownership, ACLs and read-only mounts are not
    /// consulted, so a `true` here does not guarantee a write will succeed.
    pub writable: bool,
    /// On-disk size of the directory node itself, in bytes
    pub size: u64,
    /// Number of entry files (sidecar and temporary files excluded)
    pub file_count: usize,
    /// Last modification time of the directory
    pub modified: DateTime<Utc>,
}
