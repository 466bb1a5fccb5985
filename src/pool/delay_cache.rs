//! Time-gated retry queue
//!
//! Items can only be taken once their ready instant has passed. Taking is a
//! non-blocking check-then-pop; nothing here ever waits.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::urls::{DelayUrl, Hyperlink};

#[derive(Default)]
pub struct DelayCache {
    heap: Mutex<BinaryHeap<Reverse<DelayUrl>>>,
    len: AtomicUsize,
}

impl DelayCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&self, item: DelayUrl) {
        let mut heap = self.heap.lock();
        heap.push(Reverse(item));
        self.len.store(heap.len(), Ordering::Release);
    }

    /// Schedule `url` to become available after `delay`
    pub fn add(&self, url: Hyperlink, delay: Duration) {
        self.offer(DelayUrl::new(url, delay));
    }

    /// Pop the earliest item if it is ready at `now`
    pub fn poll_ready(&self, now: Instant) -> Option<DelayUrl> {
        let mut heap = self.heap.lock();
        if !heap.peek().is_some_and(|Reverse(head)| head.is_ready(now)) {
            return None;
        }
        let item = heap.pop().map(|Reverse(item)| item);
        self.len.store(heap.len(), Ordering::Release);
        item
    }

    pub fn poll(&self) -> Option<DelayUrl> {
        self.poll_ready(Instant::now())
    }

    pub fn has_ready(&self, now: Instant) -> bool {
        self.heap
            .lock()
            .peek()
            .is_some_and(|Reverse(head)| head.is_ready(now))
    }

    /// Ready instant of the earliest item
    pub fn next_ready_at(&self) -> Option<Instant> {
        self.heap.lock().peek().map(|Reverse(head)| head.ready_at())
    }

    /// Number of items that will be ready within `window` from now
    ///
    /// A window reaching past the representable future counts every item.
    pub fn count_ready_within(&self, window: Duration) -> usize {
        let Some(horizon) = Instant::now().checked_add(window) else {
            return self.len();
        };
        self.heap
            .lock()
            .iter()
            .filter(|Reverse(item)| item.ready_at() <= horizon)
            .count()
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every item matching `predicate`; returns how many were removed
    pub fn remove_if<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&DelayUrl) -> bool,
    {
        let mut heap = self.heap.lock();
        let before = heap.len();
        heap.retain(|Reverse(item)| !predicate(item));
        self.len.store(heap.len(), Ordering::Release);
        before - heap.len()
    }

    /// Drop items whose wrapped URL is past its deadline
    pub fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        self.remove_if(|item| item.url().is_expired(now))
    }

    pub fn clear(&self) {
        let mut heap = self.heap.lock();
        heap.clear();
        self.len.store(0, Ordering::Release);
    }
}
