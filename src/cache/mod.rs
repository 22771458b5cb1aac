//! Cache Module
//!
//! Provides directory-backed caching with TTL expiration and size-bounded cleanup.

mod clock;
mod entry;
mod info;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{entry_file_name, is_expired, CacheEntry};
pub use info::DirectoryInfo;
pub use stats::CacheStats;
pub use store::{CleanupReport, DiskStore};

// == Public Constants ==
/// Name of the statistics sidecar inside the cache directory
pub const STATS_FILE: &str = ".stats";

/// Extension appended to sanitized keys
pub const ENTRY_EXTENSION: &str = "json";

/// Extension of in-flight writes, renamed into place on completion
pub const TEMP_EXTENSION: &str = "tmp";
