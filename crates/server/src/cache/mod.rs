//! Caching for resolved menu payloads and image bytes.
//!
//! Two independent caches with different freshness rules:
//!
//! - [`menu`] - memoizes resolved-menu payloads per query filter; any write
//!   to menu or ledger state invalidates every entry (coarse on purpose:
//!   items cross-reference shared ingredients, so partial invalidation is
//!   not worth the risk of an under-invalidation).
//! - [`image`] - LRU byte cache for menu images; validity is independent of
//!   menu freshness, entries leave only on eviction or explicit removal.

pub mod image;
pub mod menu;

use serde::Serialize;

/// Hit/miss readout for the cache admin endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hits over total lookups; 0 when nothing was looked up yet.
    pub hit_rate: f64,
    pub entries: u64,
}

impl CacheStats {
    #[must_use]
    pub fn new(hits: u64, misses: u64, entries: u64) -> Self {
        let total = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            hits,
            misses,
            hit_rate,
            entries,
        }
    }
}
