//! Doc Cache - A persistent on-disk cache
//!
//! Stores JSON-serializable values as one file per key, with TTL expiration,
//! a total size budget and statistics that survive restarts.

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod tasks;

pub use cache::{CacheStats, CleanupReport, Clock, DirectoryInfo, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use manager::CacheManager;
pub use tasks::spawn_cleanup_task;
