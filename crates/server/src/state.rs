//! Application state shared across handlers.
//!
//! The cache instances are constructed here once at startup and injected
//! everywhere they are used - no module-level singletons. The state is
//! cheaply cloneable via `Arc`.

use std::sync::Arc;

use crate::auth::{AllowAll, Authenticator};
use crate::cache::image::ImageCache;
use crate::cache::menu::MenuViewCache;
use crate::clock::{Clock, SystemClock};
use crate::config::KombuConfig;
use crate::stock::{AvailabilityResolver, BatchLedger, StockMutator};
use crate::store::MemoryStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: KombuConfig,
    store: MemoryStore,
    clock: Arc<dyn Clock>,
    authenticator: Arc<dyn Authenticator>,
    menu_cache: Arc<MenuViewCache>,
    image_cache: Arc<ImageCache>,
}

impl AppState {
    /// Production state: system clock, allow-all development authenticator.
    #[must_use]
    pub fn new(config: KombuConfig) -> Self {
        Self::with_parts(
            config,
            MemoryStore::new(),
            Arc::new(SystemClock),
            Arc::new(AllowAll),
        )
    }

    /// Fully injected state, used by tests to pin the clock or swap the
    /// authentication policy.
    #[must_use]
    pub fn with_parts(
        config: KombuConfig,
        store: MemoryStore,
        clock: Arc<dyn Clock>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let menu_cache = Arc::new(MenuViewCache::new(
            config.menu_cache_ttl,
            config.menu_cache_capacity,
        ));
        let image_cache = Arc::new(ImageCache::new(
            config.image_cache_max_entries,
            config.image_cache_max_bytes,
            config.image_preload_threshold,
        ));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                clock,
                authenticator,
                menu_cache,
                image_cache,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &KombuConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.inner.store
    }

    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.inner.clock)
    }

    #[must_use]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.inner.authenticator.as_ref()
    }

    #[must_use]
    pub fn menu_cache(&self) -> &MenuViewCache {
        &self.inner.menu_cache
    }

    #[must_use]
    pub fn image_cache(&self) -> &ImageCache {
        &self.inner.image_cache
    }

    /// Batch ledger service over the shared store.
    #[must_use]
    pub fn ledger(&self) -> BatchLedger {
        BatchLedger::new(
            self.inner.store.clone(),
            Arc::clone(&self.inner.clock),
            Arc::clone(&self.inner.menu_cache),
        )
    }

    /// Availability resolver over the shared store.
    #[must_use]
    pub fn resolver(&self) -> AvailabilityResolver {
        AvailabilityResolver::new(self.inner.store.clone(), Arc::clone(&self.inner.clock))
    }

    /// Stock mutator over the shared store.
    #[must_use]
    pub fn mutator(&self) -> StockMutator {
        StockMutator::new(
            self.inner.store.clone(),
            Arc::clone(&self.inner.clock),
            Arc::clone(&self.inner.menu_cache),
        )
    }

    /// Warm the image cache with frequently requested images.
    ///
    /// Best-effort and detached: the triggering request never waits on disk
    /// reads for other images.
    pub fn start_image_preload(&self) {
        let state = self.clone();
        tokio::spawn(async move {
            for name in state.image_cache().preload_candidates() {
                let path = state.config().image_dir.join(&name);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        tracing::debug!(image = %name, "image preloaded");
                        state.image_cache().insert(name, bytes);
                    }
                    Err(error) => {
                        tracing::debug!(image = %name, %error, "image preload skipped");
                    }
                }
            }
        });
    }
}
