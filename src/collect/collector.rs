//! The collector contract
//!
//! A collector pulls a small, bounded batch from one source into a `UrlSink`
//! and never blocks waiting for work. The fair collector, the loading iterable
//! and the frontier's registry only ever see this trait.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::pool::PriorityCache;
use crate::urls::Hyperlink;

/// Destination of collected URLs
pub trait UrlSink {
    fn add_last(&mut self, url: Hyperlink);

    /// Stage a batch ahead of normally added items, keeping the batch's order
    fn add_first_all(&mut self, urls: Vec<Hyperlink>);
}

impl UrlSink for Vec<Hyperlink> {
    fn add_last(&mut self, url: Hyperlink) {
        self.push(url);
    }

    fn add_first_all(&mut self, urls: Vec<Hyperlink>) {
        self.splice(0..0, urls);
    }
}

impl UrlSink for VecDeque<Hyperlink> {
    fn add_last(&mut self, url: Hyperlink) {
        self.push_back(url);
    }

    fn add_first_all(&mut self, urls: Vec<Hyperlink>) {
        for url in urls.into_iter().rev() {
            self.push_front(url);
        }
    }
}

/// Lock-free collect statistics kept by every collector
#[derive(Debug, Default)]
pub struct CollectorCounters {
    collect_calls: AtomicU64,
    collected: AtomicU64,
    /// Milliseconds since the epoch of the last non-empty pull, 0 if none
    last_collected_at: AtomicI64,
}

impl CollectorCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `collect_to` call that produced `count` items
    pub fn record(&self, count: usize) {
        self.collect_calls.fetch_add(1, Ordering::Relaxed);
        if count > 0 {
            self.collected.fetch_add(count as u64, Ordering::Relaxed);
            self.last_collected_at
                .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
        }
    }

    pub fn collect_calls(&self) -> u64 {
        self.collect_calls.load(Ordering::Relaxed)
    }

    pub fn collected(&self) -> u64 {
        self.collected.load(Ordering::Relaxed)
    }

    pub fn last_collected_at(&self) -> Option<DateTime<Utc>> {
        match self.last_collected_at.load(Ordering::Relaxed) {
            0 => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CollectorStats {
        CollectorStats {
            collect_calls: self.collect_calls(),
            collected: self.collected(),
            last_collected_at: self.last_collected_at(),
        }
    }

    pub fn reset(&self) {
        self.collect_calls.store(0, Ordering::Relaxed);
        self.collected.store(0, Ordering::Relaxed);
        self.last_collected_at.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    pub collect_calls: u64,
    pub collected: u64,
    pub last_collected_at: Option<DateTime<Utc>>,
}

/// A bounded, non-blocking source of URLs
pub trait UrlCollector: Send + Sync {
    fn name(&self) -> String;

    fn set_name(&self, name: &str);

    /// Larger is more urgent
    fn priority(&self) -> i32;

    /// URLs available locally
    fn size(&self) -> usize;

    fn external_size(&self) -> usize {
        0
    }

    /// Local plus estimated external size
    fn estimated_size(&self) -> usize {
        self.size()
    }

    fn has_more(&self) -> bool;

    /// Pull one small batch into `sink`; returns the number of URLs added
    fn collect_to(&self, sink: &mut dyn UrlSink) -> usize;

    fn counters(&self) -> &CollectorCounters;

    /// The pool cache this collector drains, if any
    fn backing_cache(&self) -> Option<&Arc<PriorityCache>> {
        None
    }

    /// Drop everything held by the underlying source
    fn clear(&self);
}

impl std::fmt::Debug for dyn UrlCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlCollector")
            .field("name", &self.name())
            .field("priority", &self.priority())
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(path: &str) -> Hyperlink {
        Hyperlink::parse(&format!("https://example.com/{path}")).unwrap()
    }

    #[test]
    fn test_vec_sink_front_batch_keeps_order() {
        let mut sink: Vec<Hyperlink> = vec![link("back")];
        sink.add_first_all(vec![link("f1"), link("f2")]);
        sink.add_last(link("last"));
        let specs: Vec<_> = sink.iter().map(|u| u.spec().to_string()).collect();
        assert_eq!(
            specs,
            [
                "https://example.com/f1",
                "https://example.com/f2",
                "https://example.com/back",
                "https://example.com/last"
            ]
        );
    }

    #[test]
    fn test_deque_sink_front_batch_keeps_order() {
        let mut sink: VecDeque<Hyperlink> = VecDeque::new();
        sink.add_last(link("back"));
        sink.add_first_all(vec![link("f1"), link("f2")]);
        assert_eq!(sink[0].spec(), "https://example.com/f1");
        assert_eq!(sink[1].spec(), "https://example.com/f2");
    }

    #[test]
    fn test_counters_record() {
        let counters = CollectorCounters::new();
        counters.record(0);
        assert_eq!(counters.collect_calls(), 1);
        assert!(counters.last_collected_at().is_none());

        counters.record(3);
        let stats = counters.snapshot();
        assert_eq!(stats.collect_calls, 2);
        assert_eq!(stats.collected, 3);
        assert!(stats.last_collected_at.is_some());

        counters.reset();
        assert_eq!(counters.collected(), 0);
    }
}
