//! The pull interface handed to fetch workers
//!
//! A small buffer is refilled, a round at a time, from the real-time
//! collector, the delay collector and the fair collector while it sits below
//! the low-water mark. Refills run in the caller's thread; nothing here spawns
//! or waits.
//!
//! Buffer positions come in three regions. `add_first` takes the head region,
//! newest first. Items staged at the front by urgent pulls take the middle
//! region in arrival order, so two urgent pulls keep their relative order.
//! Everything else is appended to the tail region.

use ahash::AHashSet;
use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::{FrontierError, FrontierResult};
use crate::collect::{FairMultiSourceCollector, UrlCollector, UrlSink};
use crate::urls::{Hyperlink, OrderKey};

const HEAD_START: i64 = i64::MIN / 2;
const FRONT_START: i64 = i64::MIN / 4;
const TAIL_START: i64 = 0;

struct Buffer {
    items: BTreeMap<i64, Hyperlink>,
    /// Order keys currently buffered; a URL already staged is not staged twice
    staged: AHashSet<OrderKey>,
    head: i64,
    front: i64,
    tail: i64,
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            staged: AHashSet::new(),
            head: HEAD_START,
            front: FRONT_START,
            tail: TAIL_START,
        }
    }
}

impl Buffer {
    fn insert(&mut self, slot: i64, url: Hyperlink) -> bool {
        if !self.staged.insert(url.order_key()) {
            return false;
        }
        self.items.insert(slot, url);
        true
    }

    fn push_head(&mut self, url: Hyperlink) -> bool {
        self.head -= 1;
        self.insert(self.head, url)
    }

    fn pop(&mut self) -> Option<Hyperlink> {
        let (_, url) = self.items.pop_first()?;
        self.staged.remove(&url.order_key());
        Some(url)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl UrlSink for Buffer {
    fn add_last(&mut self, url: Hyperlink) {
        let slot = self.tail;
        self.tail += 1;
        self.insert(slot, url);
    }

    fn add_first_all(&mut self, urls: Vec<Hyperlink>) {
        for url in urls {
            let slot = self.front;
            self.front += 1;
            self.insert(slot, url);
        }
    }
}

/// Items collected outside the buffer lock
#[derive(Default)]
struct Staging {
    front: Vec<Hyperlink>,
    back: Vec<Hyperlink>,
}

impl UrlSink for Staging {
    fn add_last(&mut self, url: Hyperlink) {
        self.back.push(url);
    }

    fn add_first_all(&mut self, urls: Vec<Hyperlink>) {
        self.front.extend(urls);
    }
}

pub struct LoadingIterable {
    realtime: Arc<dyn UrlCollector>,
    delay: Arc<dyn UrlCollector>,
    fair: Arc<FairMultiSourceCollector>,
    low_water_mark: usize,
    buffer: Mutex<Buffer>,
}

impl LoadingIterable {
    #[must_use]
    pub fn new(
        realtime: Arc<dyn UrlCollector>,
        delay: Arc<dyn UrlCollector>,
        fair: Arc<FairMultiSourceCollector>,
        low_water_mark: usize,
    ) -> Self {
        Self {
            realtime,
            delay,
            fair,
            low_water_mark: low_water_mark.max(1),
            buffer: Mutex::new(Buffer::default()),
        }
    }

    pub fn low_water_mark(&self) -> usize {
        self.low_water_mark
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when any source may still yield a URL
    pub fn has_more(&self) -> bool {
        self.realtime.has_more() || self.delay.has_more() || self.fair.has_more()
    }

    /// One composite round: real-time and ready retries first, then the fair
    /// collector fills the back while the buffer is low
    ///
    /// Real-time and retry pulls are staged at the front only when their
    /// collector sits at or above the fair collector's highest threshold.
    fn collect_round(&self) -> usize {
        let mut staging = Staging::default();
        let mut count = 0;

        let threshold = self.fair.highest_threshold();
        for urgent in [&self.realtime, &self.delay] {
            if !urgent.has_more() {
                continue;
            }
            if urgent.priority() >= threshold {
                let mut pulled: Vec<Hyperlink> = Vec::new();
                count += urgent.collect_to(&mut pulled);
                staging.add_first_all(pulled);
            } else {
                count += urgent.collect_to(&mut staging);
            }
        }
        if self.len() < self.low_water_mark && self.fair.has_more() {
            count += self.fair.collect_to(&mut staging);
        }

        if count > 0 {
            let mut buffer = self.buffer.lock();
            buffer.add_first_all(staging.front);
            for url in staging.back {
                buffer.add_last(url);
            }
        }
        count
    }

    /// Refill while below the low-water mark; true when a URL is buffered
    pub fn has_next(&self) -> bool {
        let mut rounds = 0usize;
        while self.len() < self.low_water_mark && self.has_more() {
            if self.collect_round() == 0 {
                break;
            }
            rounds += 1;
        }
        if rounds > 0 {
            debug!("Refilled frontier buffer in {rounds} rounds, {} buffered", self.len());
        }
        !self.is_empty()
    }

    /// Pop the next buffered URL
    ///
    /// Call `has_next` first; nothing is collected here.
    pub fn next_url(&self) -> FrontierResult<Hyperlink> {
        self.buffer.lock().pop().ok_or(FrontierError::Empty)
    }

    /// Put `url` ahead of everything buffered
    pub fn add_first(&self, url: Hyperlink) -> bool {
        self.buffer.lock().push_head(url)
    }

    /// Put `url` behind everything buffered
    pub fn add_last(&self, url: Hyperlink) -> bool {
        let mut buffer = self.buffer.lock();
        let before = buffer.len();
        buffer.add_last(url);
        buffer.len() > before
    }

    pub fn clear(&self) {
        *self.buffer.lock() = Buffer::default();
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { iterable: self }
    }
}

/// Draining iterator; ends when `has_next` turns false
pub struct Iter<'a> {
    iterable: &'a LoadingIterable,
}

impl Iterator for Iter<'_> {
    type Item = Hyperlink;

    fn next(&mut self) -> Option<Hyperlink> {
        if !self.iterable.has_next() {
            return None;
        }
        self.iterable.next_url().ok()
    }
}

impl<'a> IntoIterator for &'a LoadingIterable {
    type Item = Hyperlink;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{DelayCacheCollector, QueueCollector};
    use crate::pool::DelayCache;
    use crate::queues::{IdentityQueue, UrlQueue};
    use std::time::Duration;

    fn link(path: &str) -> Hyperlink {
        Hyperlink::parse(&format!("https://example.com/{path}")).unwrap()
    }

    fn queue_collector(name: &str, priority: i32, paths: &[&str]) -> Arc<dyn UrlCollector> {
        let queue: Arc<dyn UrlQueue> = Arc::new(IdentityQueue::reentrant());
        for path in paths {
            queue.offer(link(path));
        }
        Arc::new(QueueCollector::new(name, priority, queue))
    }

    fn iterable(
        realtime: Arc<dyn UrlCollector>,
        delay: Arc<DelayCache>,
        fair: Arc<FairMultiSourceCollector>,
        low_water_mark: usize,
    ) -> LoadingIterable {
        with_delay_priority(realtime, delay, 1000, fair, low_water_mark)
    }

    fn with_delay_priority(
        realtime: Arc<dyn UrlCollector>,
        delay: Arc<DelayCache>,
        delay_priority: i32,
        fair: Arc<FairMultiSourceCollector>,
        low_water_mark: usize,
    ) -> LoadingIterable {
        LoadingIterable::new(
            realtime,
            Arc::new(DelayCacheCollector::new(delay, delay_priority)),
            fair,
            low_water_mark,
        )
    }

    fn specs(iterable: &LoadingIterable) -> Vec<String> {
        iterable.iter().map(|u| u.spec().to_string()).collect()
    }

    #[test]
    fn test_realtime_ahead_of_fair() {
        let fair = Arc::new(FairMultiSourceCollector::new(6000, Some(3)));
        fair.add(queue_collector("normal", 0, &["n1", "n2"]));
        let it = iterable(
            queue_collector("realtime", 7000, &["rt"]),
            Arc::new(DelayCache::new()),
            fair,
            10,
        );
        assert_eq!(
            specs(&it),
            [
                "https://example.com/rt",
                "https://example.com/n1",
                "https://example.com/n2"
            ]
        );
        assert!(matches!(it.next_url(), Err(FrontierError::Empty)));
    }

    #[test]
    fn test_ready_retry_below_threshold_is_appended() {
        let fair = Arc::new(FairMultiSourceCollector::new(6000, Some(3)));
        let delay = Arc::new(DelayCache::new());
        let it = iterable(queue_collector("realtime", 7000, &[]), Arc::clone(&delay), fair, 10);
        it.add_last(link("queued"));
        delay.add(link("retry"), Duration::ZERO);
        assert!(it.has_next());
        assert_eq!(it.next_url().unwrap().spec(), "https://example.com/queued");
        assert_eq!(it.next_url().unwrap().spec(), "https://example.com/retry");
    }

    #[test]
    fn test_ready_retry_at_threshold_goes_front() {
        let fair = Arc::new(FairMultiSourceCollector::new(6000, Some(3)));
        let delay = Arc::new(DelayCache::new());
        let it = with_delay_priority(
            queue_collector("realtime", 7000, &[]),
            Arc::clone(&delay),
            6000,
            fair,
            10,
        );
        it.add_last(link("queued"));
        delay.add(link("retry"), Duration::ZERO);
        assert!(it.has_next());
        assert_eq!(it.next_url().unwrap().spec(), "https://example.com/retry");
        assert_eq!(it.next_url().unwrap().spec(), "https://example.com/queued");
    }

    #[test]
    fn test_realtime_below_threshold_is_appended() {
        let fair = Arc::new(FairMultiSourceCollector::new(6000, Some(3)));
        let it = iterable(
            queue_collector("realtime", 0, &["rt"]),
            Arc::new(DelayCache::new()),
            fair,
            10,
        );
        it.add_last(link("queued"));
        assert_eq!(
            specs(&it),
            ["https://example.com/queued", "https://example.com/rt"]
        );
    }

    #[test]
    fn test_low_water_mark_bounds_refill() {
        let fair = Arc::new(FairMultiSourceCollector::new(6000, Some(3)));
        fair.add(queue_collector("normal", 0, &["a", "b", "c", "d"]));
        let it = iterable(queue_collector("realtime", 7000, &[]), Arc::new(DelayCache::new()), fair, 2);
        assert!(it.has_next());
        assert_eq!(it.len(), 2);
        assert_eq!(specs(&it).len(), 4);
    }

    #[test]
    fn test_add_first_and_coalescing() {
        let fair = Arc::new(FairMultiSourceCollector::new(6000, Some(3)));
        let it = iterable(queue_collector("realtime", 7000, &[]), Arc::new(DelayCache::new()), fair, 10);
        let dup = link("dup");
        assert!(it.add_last(dup.clone()));
        assert!(!it.add_last(dup));
        assert!(it.add_first(link("first")));
        assert!(it.add_first(link("newest")));
        assert_eq!(
            specs(&it),
            [
                "https://example.com/newest",
                "https://example.com/first",
                "https://example.com/dup"
            ]
        );
        it.add_last(link("x"));
        it.clear();
        assert!(!it.has_next());
    }

    #[test]
    fn test_stable_front_staging() {
        let mut buffer = Buffer::default();
        buffer.add_last(link("normal"));
        buffer.add_first_all(vec![link("urgent1")]);
        buffer.add_first_all(vec![link("urgent2")]);
        let order: Vec<_> = std::iter::from_fn(|| buffer.pop())
            .map(|u| u.spec().to_string())
            .collect();
        assert_eq!(
            order,
            [
                "https://example.com/urgent1",
                "https://example.com/urgent2",
                "https://example.com/normal"
            ]
        );
    }
}
