//! Collector over a single queue

use parking_lot::RwLock;
use std::sync::Arc;

use super::collector::{CollectorCounters, UrlCollector, UrlSink};
use crate::queues::UrlQueue;

/// Takes one URL per pull from any `UrlQueue`
///
/// `load_args`, when set, are appended to the args of every collected URL.
pub struct QueueCollector {
    name: RwLock<String>,
    priority: i32,
    queue: Arc<dyn UrlQueue>,
    load_args: Option<String>,
    counters: CollectorCounters,
}

impl QueueCollector {
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32, queue: Arc<dyn UrlQueue>) -> Self {
        Self {
            name: RwLock::new(name.into()),
            priority,
            queue,
            load_args: None,
            counters: CollectorCounters::new(),
        }
    }

    #[must_use]
    pub fn with_load_args(mut self, args: impl Into<String>) -> Self {
        let args = args.into();
        self.load_args = (!args.is_empty()).then_some(args);
        self
    }

    pub fn load_args(&self) -> Option<&str> {
        self.load_args.as_deref()
    }

    pub fn queue(&self) -> &Arc<dyn UrlQueue> {
        &self.queue
    }
}

impl UrlCollector for QueueCollector {
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
        self.queue.size()
    }

    fn external_size(&self) -> usize {
        self.queue.external_size()
    }

    fn estimated_size(&self) -> usize {
        self.queue.estimated_size()
    }

    fn has_more(&self) -> bool {
        self.queue.has_more()
    }

    fn collect_to(&self, sink: &mut dyn UrlSink) -> usize {
        let count = match self.queue.poll() {
            Some(mut url) => {
                if let Some(args) = &self.load_args {
                    url.append_args(args);
                }
                sink.add_last(url);
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
        self.queue.clear();
    }
}
