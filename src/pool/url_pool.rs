//! The registry of priority caches
//!
//! A `UrlPool` holds one ordered cache per level of the 13-level scale, a
//! real-time cache above all of them, a delay cache for retries and a list of
//! unordered caches added at runtime. Ordered caches are created on first use
//! and the set is complete once initialized.

use chrono::Utc;
use log::debug;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::cache::PriorityCache;
use super::delay_cache::DelayCache;
use crate::config::FrontierConfig;
use crate::queues::ExternalUrlLoader;
use crate::urls::{Hyperlink, Priority13};

/// Priority of the real-time cache, one step above every ordered level
///
/// Also keeps the real-time partitions apart from the HIGHEST cache's.
pub const REAL_TIME_PRIORITY: i32 = Priority13::HIGHEST.value() + 1000;

/// How the pool builds its caches
#[derive(Clone)]
enum CacheFactory {
    Concurrent,
    Loading {
        loader: Arc<dyn ExternalUrlLoader>,
        capacity: usize,
    },
}

pub struct UrlPool {
    id: Uuid,
    config: FrontierConfig,
    factory: CacheFactory,
    initialized: AtomicBool,
    real_time_cache: Arc<PriorityCache>,
    delay_cache: Arc<DelayCache>,
    ordered_caches: RwLock<BTreeMap<i32, Arc<PriorityCache>>>,
    unordered_caches: RwLock<Vec<Arc<PriorityCache>>>,
}

impl UrlPool {
    /// Pool of in-memory caches
    #[must_use]
    pub fn concurrent(config: FrontierConfig) -> Self {
        Self::with_factory(config, CacheFactory::Concurrent)
    }

    /// Pool whose caches page in from `loader` and write overflow back to it
    #[must_use]
    pub fn loading(loader: Arc<dyn ExternalUrlLoader>, config: FrontierConfig) -> Self {
        let capacity = config.cache_capacity();
        Self::with_factory(config, CacheFactory::Loading { loader, capacity })
    }

    fn with_factory(config: FrontierConfig, factory: CacheFactory) -> Self {
        let real_time_cache = match &factory {
            CacheFactory::Concurrent => PriorityCache::concurrent(
                "realtime",
                REAL_TIME_PRIORITY,
                config.n_reentrant_bound(),
            ),
            CacheFactory::Loading { loader, .. } => PriorityCache::loading(
                "realtime",
                REAL_TIME_PRIORITY,
                Arc::clone(loader),
                config.realtime_capacity(),
                &config,
            ),
        };

        Self {
            id: Uuid::new_v4(),
            config,
            factory,
            initialized: AtomicBool::new(false),
            real_time_cache: Arc::new(real_time_cache),
            delay_cache: Arc::new(DelayCache::new()),
            ordered_caches: RwLock::new(BTreeMap::new()),
            unordered_caches: RwLock::new(Vec::new()),
        }
    }

    fn create_cache(&self, level: Priority13) -> PriorityCache {
        match &self.factory {
            CacheFactory::Concurrent => PriorityCache::concurrent(
                level.name(),
                level.value(),
                self.config.n_reentrant_bound(),
            ),
            CacheFactory::Loading { loader, capacity } => PriorityCache::loading(
                level.name(),
                level.value(),
                Arc::clone(loader),
                *capacity,
                &self.config,
            ),
        }
    }

    /// Create the ordered caches; later calls are no-ops
    pub fn initialize(&self) {
        // Hold the write lock across the flag flip so readers never see a partial set.
        let mut caches = self.ordered_caches.write();
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            for level in Priority13::ALL {
                caches
                    .entry(level.value())
                    .or_insert_with(|| Arc::new(self.create_cache(level)));
            }
            debug!("URL pool {} initialized with {} ordered caches", self.id, caches.len());
        }
    }

    fn ensure_initialized(&self) -> &Self {
        if !self.initialized.load(Ordering::Acquire) {
            self.initialize();
        }
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &FrontierConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn real_time_cache(&self) -> &Arc<PriorityCache> {
        &self.real_time_cache
    }

    pub fn delay_cache(&self) -> &Arc<DelayCache> {
        &self.delay_cache
    }

    /// The ordered cache of a level
    pub fn cache(&self, level: Priority13) -> Arc<PriorityCache> {
        self.ensure_initialized();
        if let Some(cache) = self.ordered_caches.read().get(&level.value()) {
            return Arc::clone(cache);
        }
        let mut caches = self.ordered_caches.write();
        Arc::clone(
            caches
                .entry(level.value())
                .or_insert_with(|| Arc::new(self.create_cache(level))),
        )
    }

    pub fn highest_cache(&self) -> Arc<PriorityCache> {
        self.cache(Priority13::HIGHEST)
    }

    pub fn higher_cache(&self) -> Arc<PriorityCache> {
        self.cache(Priority13::HIGHER)
    }

    pub fn normal_cache(&self) -> Arc<PriorityCache> {
        self.cache(Priority13::NORMAL)
    }

    pub fn lower_cache(&self) -> Arc<PriorityCache> {
        self.cache(Priority13::LOWER)
    }

    pub fn lowest_cache(&self) -> Arc<PriorityCache> {
        self.cache(Priority13::LOWEST)
    }

    /// Snapshot of the ordered caches, most urgent first
    pub fn ordered_caches(&self) -> Vec<Arc<PriorityCache>> {
        self.ensure_initialized()
            .ordered_caches
            .read()
            .values()
            .rev()
            .cloned()
            .collect()
    }

    pub fn ordered_priorities(&self) -> Vec<i32> {
        self.ensure_initialized()
            .ordered_caches
            .read()
            .keys()
            .copied()
            .collect()
    }

    pub fn unordered_caches(&self) -> Vec<Arc<PriorityCache>> {
        self.unordered_caches.read().clone()
    }

    pub fn add_unordered_cache(&self, cache: Arc<PriorityCache>) {
        self.unordered_caches.write().push(cache);
    }

    /// Remove `cache` (by identity) from the unordered list
    pub fn remove_unordered_cache(&self, cache: &Arc<PriorityCache>) -> bool {
        let mut caches = self.unordered_caches.write();
        let before = caches.len();
        caches.retain(|c| !Arc::ptr_eq(c, cache));
        before != caches.len()
    }

    /// Build a cache of the pool's kind for runtime registration
    ///
    /// Loading caches built here partition under `<job_id>.<name>` so they
    /// never share external batches with an ordered cache of equal priority.
    pub fn new_cache(&self, name: &str, priority: i32) -> PriorityCache {
        match &self.factory {
            CacheFactory::Concurrent => {
                PriorityCache::concurrent(name, priority, self.config.n_reentrant_bound())
            }
            CacheFactory::Loading { loader, capacity } => {
                let mut config = self.config.clone();
                config.job_id = format!("{}.{name}", self.config.job_id());
                PriorityCache::loading(name, priority, Arc::clone(loader), *capacity, &config)
            }
        }
    }

    /// Route `url` into the reentrant queue of its priority level
    pub fn add(&self, url: Hyperlink) -> bool {
        let level = Priority13::lower_priority(url.priority());
        self.cache(level).reentrant_queue().offer(url)
    }

    /// Parse `spec` and add it at `priority`
    pub fn add_spec(&self, spec: &str, priority: Priority13) -> anyhow::Result<bool> {
        let url = Hyperlink::parse(spec)?.with_priority(priority);
        Ok(self.add(url))
    }

    /// Add every URL; returns the number accepted
    pub fn add_all<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = Hyperlink>,
    {
        urls.into_iter().filter(|url| self.add(url.clone())).count()
    }

    /// Items held by the ordered caches
    pub fn ordered_count(&self) -> usize {
        self.ensure_initialized()
            .ordered_caches
            .read()
            .values()
            .map(|c| c.size())
            .sum()
    }

    /// Items held anywhere in the pool
    pub fn total_count(&self) -> usize {
        let unordered: usize = self.unordered_caches.read().iter().map(|c| c.size()).sum();
        self.ordered_count() + self.real_time_cache.size() + self.delay_cache.len() + unordered
    }

    pub fn has_more(&self) -> bool {
        self.ordered_count() > 0
    }

    /// Purge URLs past their deadline pool-wide, the delay cache included
    pub fn remove_deceased(&self) -> usize {
        let now = Utc::now();
        let ordered: usize = self
            .ordered_caches()
            .iter()
            .map(|c| c.remove_expired(now))
            .sum();
        let unordered: usize = self
            .unordered_caches()
            .iter()
            .map(|c| c.remove_expired(now))
            .sum();
        let removed = ordered
            + unordered
            + self.real_time_cache.remove_expired(now)
            + self.delay_cache.remove_expired(now);
        if removed > 0 {
            debug!("Removed {removed} deceased URLs from pool {}", self.id);
        }
        removed
    }

    /// Empty every cache; the caches themselves stay registered
    pub fn clear(&self) {
        self.ordered_caches().iter().for_each(|c| c.clear());
        self.unordered_caches().iter().for_each(|c| c.clear());
        self.real_time_cache.clear();
        self.delay_cache.clear();
    }
}
