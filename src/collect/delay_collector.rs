//! Collector over the delay cache
//!
//! `has_more` only reports true when an item is ready. A pending but not yet
//! ready retry does not count as work, so the fair collector never spins on it.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

use super::collector::{CollectorCounters, UrlCollector, UrlSink};
use crate::pool::DelayCache;

pub struct DelayCacheCollector {
    name: RwLock<String>,
    priority: i32,
    cache: Arc<DelayCache>,
    counters: CollectorCounters,
}

impl DelayCacheCollector {
    #[must_use]
    pub fn new(cache: Arc<DelayCache>, priority: i32) -> Self {
        Self {
            name: RwLock::new("delay".to_string()),
            priority,
            cache,
            counters: CollectorCounters::new(),
        }
    }

    /// Items still waiting, ready or not
    pub fn pending(&self) -> usize {
        self.cache.len()
    }
}

impl UrlCollector for DelayCacheCollector {
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
        self.cache.len()
    }

    fn has_more(&self) -> bool {
        self.cache.has_ready(Instant::now())
    }

    fn collect_to(&self, sink: &mut dyn UrlSink) -> usize {
        let count = match self.cache.poll() {
            Some(item) => {
                sink.add_last(item.into_url());
                1
            }
            None => 0,
        };
        self.counters.record(count);
        count
    }

    fn counters(&self) -> &CollectorCounters {
        &self.counters
    }

    fn clear(&self) {
        self.cache.clear();
    }
}
