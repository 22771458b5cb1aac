//! Cache Manager
//!
//! Lifecycle facade over the disk store: lazy initialization, the periodic
//! cleanup timer, and the read/write API consumed by cache clients.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CleanupReport, Clock, DirectoryInfo, DiskStore, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_cleanup_task;

/// Per-instance state machine.
enum Lifecycle {
    Uninitialized,
    Running(JoinHandle<()>),
    Closed { initialized: bool },
}

// == Cache Manager ==
/// Persistent TTL cache rooted at one directory.
///
/// Operations called before [`init`](Self::init) initialize the cache first.
/// After [`close`](Self::close), writes fail with [`CacheError::Config`] and
/// reads miss.
///
/// Filesystem work runs on tokio's blocking pool under the store's write lock,
/// so a long cleanup pass delays other cache calls but never stalls a runtime
/// worker.
///
/// # Example
/// ```no_run
/// use doc_cache::{CacheConfig, CacheManager};
///
/// # async fn run() -> doc_cache::Result<()> {
/// let cache = CacheManager::new(CacheConfig::new(".cache/docs", 10 * 1024 * 1024, 3_600_000))?;
/// cache.init().await?;
///
/// cache.set("serde/latest", &vec!["Serialize", "Deserialize"]).await?;
/// let traits: Option<Vec<String>> = cache.get("serde/latest").await;
///
/// cache.close().await;
/// # Ok(())
/// # }
/// ```
pub struct CacheManager {
    config: CacheConfig,
    store: Arc<RwLock<DiskStore>>,
    lifecycle: Mutex<Lifecycle>,
}

impl CacheManager {
    // == Constructor ==
    /// Creates a manager using the system clock. Does not touch the filesystem.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }

    /// Creates a manager reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: impl Clock) -> Result<Self> {
        config.validate()?;
        let store = DiskStore::new(&config, Arc::new(clock));

        Ok(Self {
            config,
            store: Arc::new(RwLock::new(store)),
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Init ==
    /// Creates the directory, reconciles statistics and starts the cleanup timer.
    ///
    /// A no-op once initialized. Fails on a closed manager.
    pub async fn init(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        match &*lifecycle {
            Lifecycle::Running(_) => return Ok(()),
            Lifecycle::Closed { .. } => return Err(CacheError::closed()),
            Lifecycle::Uninitialized => {}
        }

        self.run_blocking(|store| store.init()).await??;

        let interval = Duration::from_millis(self.config.cleanup_interval);
        let handle = spawn_cleanup_task(self.store.clone(), interval);
        *lifecycle = Lifecycle::Running(handle);

        info!("Cache manager started for {}", self.config.cache_dir.display());
        Ok(())
    }

    // == Get ==
    /// Returns the value stored under `key`, or `None` on any kind of miss.
    ///
    /// A stored payload that does not deserialize into `T` is also `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Err(e) = self.init().await {
            warn!("Cache get for {} skipped: {}", key, e);
            return None;
        }

        let owned_key = key.to_string();
        let value = match self.run_blocking(move |store| store.get(&owned_key)).await {
            Ok(value) => value?,
            Err(e) => {
                warn!("Cache get for {} failed: {}", key, e);
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cached value for {} has an unexpected shape: {}", key, e);
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.init().await?;
        let value = serde_json::to_value(value)?;
        let key = key.to_string();
        self.run_blocking(move |store| store.set(&key, &value)).await?
    }

    // == Delete ==
    /// Removes `key`, returning whether an entry existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.init().await?;
        let key = key.to_string();
        self.run_blocking(move |store| store.delete(&key)).await?
    }

    // == Clear ==
    pub async fn clear(&self) -> Result<()> {
        self.init().await?;
        self.run_blocking(|store| store.clear()).await?
    }

    // == Cleanup ==
    /// Runs a cleanup pass immediately.
    pub async fn cleanup(&self) -> Result<CleanupReport> {
        self.init().await?;
        self.run_blocking(|store| store.cleanup()).await?
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    // == Directory Info ==
    pub async fn directory_info(&self) -> Result<DirectoryInfo> {
        self.run_blocking(|store| store.directory_info()).await?
    }

    // == Close ==
    /// Stops the cleanup timer and persists final statistics.
    ///
    /// Safe to call repeatedly; later calls only re-persist statistics. A
    /// cleanup pass already running completes before the stats are written.
    pub async fn close(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let previous = std::mem::replace(
            &mut *lifecycle,
            Lifecycle::Closed { initialized: false },
        );
        let initialized = match previous {
            Lifecycle::Running(handle) => {
                handle.abort();
                info!("Cache manager closed for {}", self.config.cache_dir.display());
                true
            }
            Lifecycle::Closed { initialized } => initialized,
            Lifecycle::Uninitialized => false,
        };
        *lifecycle = Lifecycle::Closed { initialized };

        if initialized {
            if let Err(e) = self.run_blocking(|store| store.persist_stats()).await {
                warn!("Failed to persist cache stats on close: {}", e);
            }
        } else {
            debug!("Cache manager closed before initialization");
        }
    }

    /// Runs `op` against the store on the blocking pool, holding the write lock.
    async fn run_blocking<F, R>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut DiskStore) -> R + Send + 'static,
        R: Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || op(&mut store.blocking_write())).await?;
        Ok(result)
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        if let Lifecycle::Running(handle) = self.lifecycle.get_mut() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
