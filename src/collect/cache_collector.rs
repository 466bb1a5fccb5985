//! Collector over one priority cache

use parking_lot::RwLock;
use std::sync::Arc;

use super::collector::{CollectorCounters, UrlCollector, UrlSink};
use crate::pool::PriorityCache;

/// Takes at most one URL from each of the cache's three queues per pull
pub struct CacheCollector {
    name: RwLock<String>,
    priority: i32,
    cache: Arc<PriorityCache>,
    counters: CollectorCounters,
}

impl CacheCollector {
    /// Collector named and prioritized after `cache`
    #[must_use]
    pub fn new(cache: Arc<PriorityCache>) -> Self {
        let priority = cache.priority();
        Self::with_priority(cache, priority)
    }

    #[must_use]
    pub fn with_priority(cache: Arc<PriorityCache>, priority: i32) -> Self {
        Self {
            name: RwLock::new(cache.name().to_string()),
            priority,
            cache,
            counters: CollectorCounters::new(),
        }
    }

    pub fn cache(&self) -> &Arc<PriorityCache> {
        &self.cache
    }
}

impl UrlCollector for CacheCollector {
    fn name(&self) -> String {
        self.name.read().clone()
    }

    fn set_name(&self, name: &str) {
        *self.name.write() = name.to_string();
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn size(&self) -> usize {
        self.cache.size()
    }

    fn external_size(&self) -> usize {
        self.cache.external_size()
    }

    fn estimated_size(&self) -> usize {
        self.cache.estimated_size()
    }

    fn has_more(&self) -> bool {
        self.cache.has_more()
    }

    fn collect_to(&self, sink: &mut dyn UrlSink) -> usize {
        let mut count = 0;
        for queue in self.cache.queues() {
            if let Some(url) = queue.poll() {
                sink.add_last(url);
                count += 1;
            }
        }
        self.counters.record(count);
        count
    }

    fn counters(&self) -> &CollectorCounters {
        &self.counters
    }

    fn backing_cache(&self) -> Option<&Arc<PriorityCache>> {
        Some(&self.cache)
    }

    fn clear(&self) {
        self.cache.clear();
    }
}
