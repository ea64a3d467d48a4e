//! Image resource cache: dual-bound LRU byte cache.
//!
//! Keyed by image path, bounded by entry count and by total byte footprint;
//! whichever bound trips first evicts least-recently-accessed entries until
//! both hold again. Access counts are tracked for keys that have held bytes
//! (surviving eviction) so frequently requested images above a threshold can
//! be re-warmed by a detached task. No TTL: image files are content-addressed by
//! filename-with-timestamp convention, so cached bytes stay valid until the
//! image is replaced or deleted and the entry is removed explicitly.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::CacheStats;

struct ImageEntry {
    bytes: std::sync::Arc<Vec<u8>>,
    last_access: u64,
}

#[derive(Default)]
struct ImageCacheInner {
    entries: HashMap<String, ImageEntry>,
    /// Request counts per key, kept across evictions for preload decisions.
    /// Only keys that have actually held bytes are counted; a lookup for a
    /// name that was never cached leaves no trace, so the map is bounded by
    /// the set of images that exist rather than by what clients request.
    access_counts: HashMap<String, u64>,
    total_bytes: usize,
    tick: u64,
}

/// LRU byte cache for menu item images.
pub struct ImageCache {
    inner: Mutex<ImageCacheInner>,
    max_entries: usize,
    max_bytes: usize,
    preload_threshold: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ImageCache {
    #[must_use]
    pub fn new(max_entries: usize, max_bytes: usize, preload_threshold: u64) -> Self {
        Self {
            inner: Mutex::new(ImageCacheInner::default()),
            max_entries,
            max_bytes,
            preload_threshold,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up cached bytes, refreshing recency and the access count. A
    /// miss leaves the count map untouched; misses on real images are
    /// counted by the `insert` that follows the disk read.
    pub fn get(&self, key: &str) -> Option<std::sync::Arc<Vec<u8>>> {
        let mut guard = self.lock();
        guard.tick += 1;
        let tick = guard.tick;

        let inner = &mut *guard;
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_access = tick;
                let bytes = std::sync::Arc::clone(&entry.bytes);
                *inner.access_counts.entry(key.to_string()).or_default() += 1;
                drop(guard);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(bytes)
            }
            None => {
                drop(guard);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert (or replace) an image, then evict least-recently-accessed
    /// entries until both the entry bound and the byte bound hold.
    pub fn insert(&self, key: String, bytes: Vec<u8>) {
        let mut inner = self.lock();
        inner.tick += 1;
        let tick = inner.tick;
        *inner.access_counts.entry(key.clone()).or_default() += 1;

        if let Some(old) = inner.entries.remove(&key) {
            inner.total_bytes -= old.bytes.len();
        }
        inner.total_bytes += bytes.len();
        inner.entries.insert(
            key,
            ImageEntry {
                bytes: std::sync::Arc::new(bytes),
                last_access: tick,
            },
        );

        while inner.entries.len() > self.max_entries || inner.total_bytes > self.max_bytes {
            let Some(oldest) = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            if let Some(evicted) = inner.entries.remove(&oldest) {
                inner.total_bytes -= evicted.bytes.len();
                tracing::debug!(image = %oldest, "image cache evicted");
            }
        }
    }

    /// Drop cached bytes for a replaced or deleted image. The access count
    /// is reset too: new content starts a new popularity record.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.lock();
        inner.access_counts.remove(key);
        match inner.entries.remove(key) {
            Some(entry) => {
                inner.total_bytes -= entry.bytes.len();
                true
            }
            None => false,
        }
    }

    /// Whether the key currently holds cached bytes.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Keys requested at least `preload_threshold` times that are not
    /// currently cached - candidates for best-effort warming.
    pub fn preload_candidates(&self) -> Vec<String> {
        let inner = self.lock();
        inner
            .access_counts
            .iter()
            .filter(|&(key, &count)| {
                count >= self.preload_threshold && !inner.entries.contains_key(key)
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Hit/miss readout.
    pub fn stats(&self) -> CacheStats {
        let entries = self.lock().entries.len() as u64;
        CacheStats::new(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            entries,
        )
    }

    /// Current byte footprint.
    pub fn total_bytes(&self) -> usize {
        self.lock().total_bytes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ImageCacheInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_bound_evicts_the_least_recently_accessed() {
        let cache = ImageCache::new(2, usize::MAX, 10);
        cache.insert("a.png".to_string(), vec![1]);
        cache.insert("b.png".to_string(), vec![2]);
        cache.get("a.png");
        cache.insert("c.png".to_string(), vec![3]);

        assert!(cache.contains("a.png"), "recently accessed survives");
        assert!(!cache.contains("b.png"), "oldest access evicted");
        assert!(cache.contains("c.png"));
    }

    #[test]
    fn byte_bound_evicts_until_it_holds() {
        let cache = ImageCache::new(usize::MAX, 10, 10);
        cache.insert("a.png".to_string(), vec![0; 6]);
        cache.insert("b.png".to_string(), vec![0; 6]);

        assert!(!cache.contains("a.png"));
        assert!(cache.contains("b.png"));
        assert!(cache.total_bytes() <= 10);
    }

    #[test]
    fn replacement_does_not_double_count_bytes() {
        let cache = ImageCache::new(4, 100, 10);
        cache.insert("a.png".to_string(), vec![0; 40]);
        cache.insert("a.png".to_string(), vec![0; 50]);

        assert_eq!(cache.total_bytes(), 50);
    }

    #[test]
    fn evicted_hot_images_become_preload_candidates() {
        let cache = ImageCache::new(1, usize::MAX, 3);
        cache.insert("hot.png".to_string(), vec![1]);
        cache.get("hot.png");
        cache.get("hot.png");
        // Evicts hot.png (entry bound is 1); its count survives.
        cache.insert("other.png".to_string(), vec![2]);

        assert!(!cache.contains("hot.png"));
        assert_eq!(cache.preload_candidates(), vec!["hot.png".to_string()]);

        // Once re-cached, it is no longer a candidate.
        cache.insert("hot.png".to_string(), vec![1]);
        assert!(cache.preload_candidates().is_empty());
    }

    #[test]
    fn lookups_for_unknown_names_leave_no_trace() {
        let cache = ImageCache::new(4, 100, 1);
        for i in 0..10_000 {
            assert!(cache.get(&format!("ghost-{i}.png")).is_none());
        }

        // No count accrues for names that never held bytes, so none of
        // them (threshold 1) can become a preload candidate.
        assert!(cache.preload_candidates().is_empty());
        assert_eq!(cache.stats().misses, 10_000);
    }

    #[test]
    fn remove_drops_bytes_and_resets_the_count() {
        let cache = ImageCache::new(4, 100, 2);
        cache.insert("a.png".to_string(), vec![0; 10]);
        cache.get("a.png");
        cache.get("a.png");

        assert!(cache.remove("a.png"));
        assert!(!cache.remove("a.png"));
        assert_eq!(cache.total_bytes(), 0);
        assert!(cache.preload_candidates().is_empty());
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let cache = ImageCache::new(4, 100, 10);
        cache.insert("a.png".to_string(), vec![1]);
        cache.get("a.png");
        cache.get("missing.png");

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.entries, 1);
    }
}
