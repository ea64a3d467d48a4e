//! Menu view cache: memoized resolved-menu payloads.
//!
//! Backed by a `moka` future cache (TTL eviction) plus a generation counter.
//! Per key the lifecycle is empty -> fresh -> stale -> fresh: a lookup with
//! no live entry resolves synchronously and stores the result; a write
//! anywhere in menu or ledger state bumps the generation and drops every
//! entry; TTL expiry demotes an untouched entry lazily at its next lookup.
//!
//! The generation counter closes the refresh race: a resolve that started
//! before an invalidation finishes against pre-write state, and its result
//! must not be stored after the invalidation. Over-invalidating is fine,
//! serving a pre-write payload after the write returned is not.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;

use kombu_core::{MenuFilter, ResolvedMenuItem};

use crate::cache::CacheStats;
use crate::error::Result;

type MenuPayload = Arc<Vec<ResolvedMenuItem>>;

/// Cache of resolved menu payloads keyed by canonical filter serialization.
pub struct MenuViewCache {
    cache: Cache<String, MenuPayload>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MenuViewCache {
    #[must_use]
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self {
            cache,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached payload for `filter`, resolving and storing it on a
    /// miss. Resolver errors propagate to the caller and nothing is stored.
    pub async fn get_or_resolve<F, Fut>(&self, filter: &MenuFilter, resolve: F) -> Result<MenuPayload>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ResolvedMenuItem>>>,
    {
        let key = filter.cache_key();
        if let Some(payload) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%key, "menu cache hit");
            return Ok(payload);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%key, "menu cache miss");

        let generation = self.generation.load(Ordering::Acquire);
        let payload: MenuPayload = Arc::new(resolve().await?);

        // Store only if no write invalidated the cache while resolving.
        if self.generation.load(Ordering::Acquire) == generation {
            self.cache.insert(key, Arc::clone(&payload)).await;
        }
        Ok(payload)
    }

    /// Drop every entry. Called on any write to menu or ledger state and by
    /// the cache admin endpoint.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::Release);
        self.cache.invalidate_all();
    }

    /// Hit/miss readout.
    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        CacheStats::new(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.cache.entry_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> MenuViewCache {
        MenuViewCache::new(Duration::from_secs(300), 256)
    }

    #[tokio::test]
    async fn second_read_is_a_hit_and_skips_the_resolver() {
        let cache = cache();
        let filter = MenuFilter::default();

        let first = cache
            .get_or_resolve(&filter, || async { Ok(Vec::new()) })
            .await
            .expect("resolve");
        let second = cache
            .get_or_resolve(&filter, || async {
                panic!("resolver must not run on a fresh entry")
            })
            .await
            .expect("cached");

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn invalidation_forces_the_next_read_to_resolve() {
        let cache = cache();
        let filter = MenuFilter::default();

        cache
            .get_or_resolve(&filter, || async { Ok(Vec::new()) })
            .await
            .expect("resolve");
        cache.invalidate_all();

        let mut resolved_again = false;
        cache
            .get_or_resolve(&filter, || {
                resolved_again = true;
                async { Ok(Vec::new()) }
            })
            .await
            .expect("resolve");
        assert!(resolved_again);
    }

    #[tokio::test]
    async fn a_resolve_racing_an_invalidation_is_not_stored() {
        let cache = cache();
        let filter = MenuFilter::default();

        // Invalidate between the miss and the store, as a concurrent write
        // would.
        cache
            .get_or_resolve(&filter, || {
                cache.invalidate_all();
                async { Ok(Vec::new()) }
            })
            .await
            .expect("resolve");

        let mut resolved_again = false;
        cache
            .get_or_resolve(&filter, || {
                resolved_again = true;
                async { Ok(Vec::new()) }
            })
            .await
            .expect("resolve");
        assert!(resolved_again, "stale payload survived the invalidation");
    }

    #[tokio::test]
    async fn ttl_expiry_forces_the_next_read_to_resolve() {
        let cache = MenuViewCache::new(Duration::from_millis(50), 256);
        let filter = MenuFilter::default();

        cache
            .get_or_resolve(&filter, || async { Ok(Vec::new()) })
            .await
            .expect("resolve");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut resolved_again = false;
        cache
            .get_or_resolve(&filter, || {
                resolved_again = true;
                async { Ok(Vec::new()) }
            })
            .await
            .expect("resolve");
        assert!(resolved_again, "entry outlived its ttl");
    }

    #[tokio::test]
    async fn distinct_filters_do_not_share_entries() {
        let cache = cache();
        let all = MenuFilter::default();
        let searched = MenuFilter {
            category: None,
            search: Some("miso".to_string()),
        };

        cache
            .get_or_resolve(&all, || async { Ok(Vec::new()) })
            .await
            .expect("resolve");

        let mut resolved = false;
        cache
            .get_or_resolve(&searched, || {
                resolved = true;
                async { Ok(Vec::new()) }
            })
            .await
            .expect("resolve");
        assert!(resolved, "different filter must not reuse the entry");
    }
}
