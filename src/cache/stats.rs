//! Cache Statistics Module
//!
//! Aggregate counters persisted in the `.stats` sidecar.

use serde::{Deserialize, Serialize};

// == Cache Stats ==
/// Aggregate statistics for one cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheStats {
    /// Sum of all live entries' recorded sizes, in bytes
    pub size: u64,
    /// Number of live entries
    pub entries: u64,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, expired or unreadable)
    pub misses: u64,
    /// Unix milliseconds of the last completed cleanup pass
    pub last_cleanup: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Accounts for a newly written entry.
    pub fn add_entry(&mut self, size: u64) {
        self.entries += 1;
        self.size += size;
    }

    /// Accounts for a removed entry, flooring both totals at zero.
    pub fn remove_entry(&mut self, size: u64) {
        self.entries = self.entries.saturating_sub(1);
        self.size = self.size.saturating_sub(size);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.last_cleanup, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_add_and_remove_entry() {
        let mut stats = CacheStats::new();
        stats.add_entry(10);
        stats.add_entry(5);
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.size, 15);

        stats.remove_entry(10);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.size, 5);
    }

    #[test]
    fn test_remove_entry_floors_at_zero() {
        let mut stats = CacheStats::new();
        stats.add_entry(3);
        stats.remove_entry(100);
        stats.remove_entry(1);
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_sidecar_field_names() {
        let stats = CacheStats {
            size: 1,
            entries: 2,
            hits: 3,
            misses: 4,
            last_cleanup: 5,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "size": 1, "entries": 2, "hits": 3, "misses": 4, "lastCleanup": 5
            })
        );
    }
}
