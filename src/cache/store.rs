//! Cache Store Module
//!
//! Synchronous filesystem engine: one JSON file per entry plus the `.stats`
//! sidecar, with TTL expiration and a size budget.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::entry::entry_file_name;
use crate::cache::{CacheEntry, CacheStats, Clock, DirectoryInfo, STATS_FILE, TEMP_EXTENSION};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Expired entries deleted
    pub removed: u64,
    /// Unparseable files deleted
    pub corrupt: u64,
    /// Live entries left on disk
    pub remaining: u64,
    /// Sum of the recorded sizes of the expired entries deleted
    pub freed: u64,
}

/// Result of reading one entry file.
enum EntryRead {
    Missing,
    Corrupt,
    Valid(CacheEntry),
}

// == Disk Store ==
/// Directory-backed cache storage.
///
/// Owns the in-memory copy of the statistics; every mutation is followed by a
/// best-effort write of the sidecar.
pub struct DiskStore {
    /// Directory holding entry files and the sidecar
    dir: PathBuf,
    /// Path of the `.stats` sidecar
    stats_path: PathBuf,
    /// Maximum total entry size in bytes
    max_size: u64,
    /// Entry TTL in milliseconds
    ttl: u64,
    /// Aggregate statistics
    stats: CacheStats,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for DiskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskStore")
            .field("dir", &self.dir)
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .field("stats", &self.stats)
            .finish()
    }
}

impl DiskStore {
    // == Constructor ==
    /// Creates a store over `config.cache_dir` without touching the filesystem.
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            stats_path: config.cache_dir.join(STATS_FILE),
            dir: config.cache_dir.clone(),
            max_size: config.max_size,
            ttl: config.ttl,
            stats: CacheStats::new(),
            clock,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // == Init ==
    /// Creates the directory, loads the sidecar and reconciles it against the
    /// entry files actually on disk.
    pub fn init(&mut self) -> Result<()> {
        let init_error = |source| CacheError::Init {
            path: self.dir.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(init_error)?;
        let loaded = self.load_stats().map_err(init_error)?;
        self.stats = loaded;
        self.reconcile().map_err(|source| CacheError::Init {
            path: self.dir.clone(),
            source,
        })?;

        info!(
            "Cache initialized at {}: {} entries, {} bytes",
            self.dir.display(),
            self.stats.entries,
            self.stats.size
        );
        Ok(())
    }

    /// Reads the sidecar; a missing or corrupt file yields zero statistics.
    fn load_stats(&self) -> io::Result<CacheStats> {
        match fs::read_to_string(&self.stats_path) {
            Ok(contents) => Ok(serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("Ignoring corrupt stats file {}: {}", self.stats_path.display(), e);
                CacheStats::new()
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(CacheStats::new()),
            Err(e) => Err(e),
        }
    }

    /// Recomputes `size` and `entries` from the valid entry files on disk.
    fn reconcile(&mut self) -> io::Result<()> {
        let mut size = 0;
        let mut entries = 0;

        for path in self.list_files()? {
            if is_temp_file(&path) {
                continue;
            }
            if let EntryRead::Valid(entry) = read_entry(&path)? {
                size += entry.size;
                entries += 1;
            }
        }

        if size != self.stats.size || entries != self.stats.entries {
            info!(
                "Reconciled cache stats: entries {} -> {}, size {} -> {}",
                self.stats.entries, entries, self.stats.size, size
            );
            self.stats.size = size;
            self.stats.entries = entries;
            self.persist_stats();
        }
        Ok(())
    }

    // == Get ==
    /// Retrieves the payload stored under `key`.
    ///
    /// Absent, expired, unreadable and corrupt entries are all misses. Expired
    /// entries are deleted; corrupt ones are left for the next cleanup pass.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);

        let value = match read_entry(&path) {
            Ok(EntryRead::Valid(entry)) if entry.is_expired(self.ttl, self.clock.now_ms()) => {
                debug!("Cache entry expired: {}", key);
                self.remove_expired(&path, entry.size);
                None
            }
            Ok(EntryRead::Valid(entry)) => Some(entry.data),
            Ok(EntryRead::Missing) => None,
            Ok(EntryRead::Corrupt) => {
                warn!("Corrupt cache entry for key {}: {}", key, path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read cache entry for key {}: {}", key, e);
                None
            }
        };

        if value.is_some() {
            debug!("Cache hit: {}", key);
            self.stats.record_hit();
        } else {
            debug!("Cache miss: {}", key);
            self.stats.record_miss();
        }
        self.persist_stats();
        value
    }

    fn remove_expired(&mut self, path: &Path, size: u64) {
        match fs::remove_file(path) {
            Ok(()) => self.stats.remove_entry(size),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove expired entry {}: {}", path.display(), e),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Runs a cleanup pass first when the write would exceed the size budget.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry::from_value(value, self.clock.now_ms())?;

        if entry.size > self.max_size {
            return Err(CacheError::EntryTooLarge {
                key: key.to_string(),
                size: entry.size,
                max_size: self.max_size,
            });
        }

        if self.stats.size + entry.size > self.max_size {
            debug!(
                "Cache over budget ({} + {} > {}), running cleanup",
                self.stats.size, entry.size, self.max_size
            );
            self.cleanup()?;
            if self.stats.size + entry.size > self.max_size {
                warn!(
                    "Cache still over budget after cleanup ({} + {} > {})",
                    self.stats.size, entry.size, self.max_size
                );
            }
        }

        let set_error = |source| CacheError::Set {
            key: key.to_string(),
            source,
        };

        let path = self.entry_path(key);
        self.remove_existing(&path).map_err(set_error)?;

        let contents = serde_json::to_vec(&entry)?;
        write_atomic(&path, &contents).map_err(set_error)?;

        self.stats.add_entry(entry.size);
        self.persist_stats();
        debug!("Cached {} bytes for key: {}", entry.size, key);
        Ok(())
    }

    // == Delete ==
    /// Removes the entry stored under `key`.
    ///
    /// Returns `false` when there was nothing to delete.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let path = self.entry_path(key);
        let removed = self
            .remove_existing(&path)
            .map_err(|source| CacheError::Delete {
                key: key.to_string(),
                source,
            })?;

        if removed {
            self.persist_stats();
            debug!("Deleted cache entry: {}", key);
        }
        Ok(removed)
    }

    /// Deletes the file at `path` if present, decrementing stats by its
    /// recorded size. Corrupt files were never counted, so removing one
    /// leaves the stats untouched.
    fn remove_existing(&mut self, path: &Path) -> io::Result<bool> {
        let counted_size = match read_entry(path)? {
            EntryRead::Missing => return Ok(false),
            EntryRead::Corrupt => None,
            EntryRead::Valid(entry) => Some(entry.size),
        };

        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        }

        if let Some(size) = counted_size {
            self.stats.remove_entry(size);
        }
        Ok(true)
    }

    // == Clear ==
    /// Removes every file except the sidecar and zeroes the statistics.
    pub fn clear(&mut self) -> Result<()> {
        let clear_error = |source| CacheError::Clear {
            path: self.dir.clone(),
            source,
        };

        let files = self.list_files().map_err(clear_error)?;
        let count = files.len();
        for path in files {
            remove_if_exists(&path).map_err(clear_error)?;
        }

        self.stats = CacheStats::new();
        self.persist_stats();
        info!("Cleared {} files from cache {}", count, self.dir.display());
        Ok(())
    }

    // == Cleanup ==
    /// Deletes expired and corrupt entries in one pass over the directory.
    ///
    /// Statistics are only updated once the whole pass has succeeded.
    pub fn cleanup(&mut self) -> Result<CleanupReport> {
        let now = self.clock.now_ms();
        let cleanup_error = |source| CacheError::Cleanup {
            path: self.dir.clone(),
            source,
        };

        let mut report = CleanupReport::default();
        for path in self.list_files().map_err(cleanup_error)? {
            if is_temp_file(&path) {
                remove_if_exists(&path).map_err(cleanup_error)?;
                continue;
            }

            match read_entry(&path).map_err(cleanup_error)? {
                EntryRead::Missing => {}
                EntryRead::Corrupt => {
                    remove_if_exists(&path).map_err(cleanup_error)?;
                    report.corrupt += 1;
                }
                EntryRead::Valid(entry) if entry.is_expired(self.ttl, now) => {
                    remove_if_exists(&path).map_err(cleanup_error)?;
                    report.removed += 1;
                    report.freed += entry.size;
                }
                EntryRead::Valid(_) => report.remaining += 1,
            }
        }

        self.stats.entries = report.remaining;
        self.stats.size = self.stats.size.saturating_sub(report.freed);
        self.stats.last_cleanup = now;
        self.persist_stats();

        info!(
            "Cache cleanup: removed {} expired and {} corrupt entries, {} remaining",
            report.removed, report.corrupt, report.remaining
        );
        Ok(report)
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // == Directory Info ==
    pub fn directory_info(&self) -> Result<DirectoryInfo> {
        let info_error = |source| CacheError::Info {
            path: self.dir.clone(),
            source,
        };

        let metadata = fs::metadata(&self.dir).map_err(info_error)?;
        let modified = metadata.modified().map_err(info_error)?;
        let file_count = self
            .list_files()
            .map_err(info_error)?
            .iter()
            .filter(|path| !is_temp_file(path))
            .count();

        Ok(DirectoryInfo {
            path: self.dir.clone(),
            exists: true,
            writable: !metadata.permissions().readonly(),
            size: metadata.len(),
            file_count,
            modified: DateTime::<Utc>::from(modified),
        })
    }

    /// Writes the sidecar. Failures are logged, never raised.
    pub fn persist_stats(&self) {
        let result = serde_json::to_vec_pretty(&self.stats)
            .map_err(io::Error::from)
            .and_then(|contents| write_atomic(&self.stats_path, &contents));

        if let Err(e) = result {
            warn!(
                "Failed to persist cache stats to {}: {}",
                self.stats_path.display(),
                e
            );
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(entry_file_name(key))
    }

    /// Lists every regular file in the directory except the sidecar.
    ///
    /// Symlinks are followed; dangling links are skipped.
    fn list_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            if dir_entry.file_name() != STATS_FILE && is_regular_file(&dir_entry)? {
                files.push(dir_entry.path());
            }
        }
        Ok(files)
    }
}

// == File Helpers ==

fn read_entry(path: &Path) -> io::Result<EntryRead> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(CacheEntry::parse(&contents)
            .map(EntryRead::Valid)
            .unwrap_or(EntryRead::Corrupt)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryRead::Missing),
        // Non-UTF-8 bytes are as untrustworthy as malformed JSON
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Ok(EntryRead::Corrupt),
        Err(e) => Err(e),
    }
}

fn is_regular_file(dir_entry: &fs::DirEntry) -> io::Result<bool> {
    let file_type = match dir_entry.file_type() {
        Ok(file_type) => file_type,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if !file_type.is_symlink() {
        return Ok(file_type.is_file());
    }

    match fs::metadata(dir_entry.path()) {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn is_temp_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TEMP_EXTENSION)
}

/// Writes via a sibling temp file and rename so readers never see a partial file.
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension(TEMP_EXTENSION);

    let result = fs::File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
