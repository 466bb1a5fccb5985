//! Ordered URL queues with re-visit policies
//!
//! One `IdentityQueue` type covers the three disciplines. The live ordered set
//! and the identity history share a single mutex so that the policy check and
//! the insert happen in one critical section: two producers offering the same
//! identity can never both pass the check.
//!
//! The history only shrinks on `clear()`. Memory grows with the number of
//! distinct identities seen; bounding it is up to the host application.

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::UrlQueue;
use crate::urls::{Hyperlink, OrderKey};

/// How often one identity may enter a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisitPolicy {
    /// Accept an identity once, ever
    NonReentrant,
    /// Accept an identity `N + 1` times: the first offer plus `N` re-entries
    NReentrant(u32),
    /// Accept every offer
    Reentrant,
}

impl RevisitPolicy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NonReentrant => "nonReentrant",
            Self::NReentrant(_) => "nReentrant",
            Self::Reentrant => "reentrant",
        }
    }

    fn admits(self, seen: u32) -> bool {
        match self {
            Self::NonReentrant => seen == 0,
            Self::NReentrant(n) => seen <= n,
            Self::Reentrant => true,
        }
    }
}

#[derive(Default)]
struct QueueState {
    /// Keyed by the URL's order key plus an insertion counter, so duplicates coexist
    live: BTreeMap<(OrderKey, u64), Hyperlink>,
    /// identity -> number of accepted offers
    history: AHashMap<u64, u32>,
    /// identity -> admitted copies written to external storage and not yet paged back
    external: AHashMap<u64, u32>,
    insertions: u64,
}

impl QueueState {
    fn insert(&mut self, url: Hyperlink) -> usize {
        self.insertions += 1;
        let key = (url.order_key(), self.insertions);
        self.live.insert(key, url);
        self.live.len()
    }
}

/// Concurrent ordered multiset of URLs guarded by a re-visit policy
pub struct IdentityQueue {
    policy: RevisitPolicy,
    state: Mutex<QueueState>,
    /// Lock-free size snapshot
    len: AtomicUsize,
}

impl IdentityQueue {
    #[must_use]
    pub fn new(policy: RevisitPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(QueueState::default()),
            len: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn non_reentrant() -> Self {
        Self::new(RevisitPolicy::NonReentrant)
    }

    #[must_use]
    pub fn n_reentrant(n: u32) -> Self {
        Self::new(RevisitPolicy::NReentrant(n))
    }

    #[must_use]
    pub fn reentrant() -> Self {
        Self::new(RevisitPolicy::Reentrant)
    }

    /// Number of accepted offers recorded for an identity
    #[must_use]
    pub fn accepted_count(&self, identity: u64) -> u32 {
        self.state.lock().history.get(&identity).copied().unwrap_or(0)
    }

    /// Number of distinct identities in the history
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Run the policy check and record the identity; true when admitted
    fn admit(&self, state: &mut QueueState, identity: u64) -> bool {
        if self.policy == RevisitPolicy::Reentrant {
            return true;
        }
        let seen = state.history.get(&identity).copied().unwrap_or(0);
        if !self.policy.admits(seen) {
            return false;
        }
        state.history.insert(identity, seen + 1);
        true
    }

    /// Admit `url` for storage outside this queue
    ///
    /// The identity is recorded in the history exactly as `offer` would, but
    /// nothing is inserted. The admitted copy is remembered so that
    /// `offer_loaded` lets it back in without a second policy check.
    pub fn admit_external(&self, url: &Hyperlink) -> bool {
        let mut state = self.state.lock();
        let identity = url.identity();
        if !self.admit(&mut state, identity) {
            return false;
        }
        if self.policy != RevisitPolicy::Reentrant {
            *state.external.entry(identity).or_insert(0) += 1;
        }
        true
    }

    /// Undo one `admit_external` whose write to storage failed
    pub fn revoke_external(&self, identity: u64) {
        if self.policy == RevisitPolicy::Reentrant {
            return;
        }
        let mut state = self.state.lock();
        if !decrement(&mut state.external, identity) {
            return;
        }
        decrement(&mut state.history, identity);
    }

    /// Insert a URL paged in from external storage
    ///
    /// A copy admitted by `admit_external` goes straight in. Anything else
    /// passes the policy check like a normal offer.
    pub fn offer_loaded(&self, url: Hyperlink) -> bool {
        let mut state = self.state.lock();
        let identity = url.identity();
        if !decrement(&mut state.external, identity) && !self.admit(&mut state, identity) {
            return false;
        }
        let len = state.insert(url);
        self.len.store(len, Ordering::Release);
        true
    }

    /// Admitted copies currently held outside the queue
    #[must_use]
    pub fn external_count(&self) -> usize {
        self.state.lock().external.values().map(|&n| n as usize).sum()
    }
}

/// Decrement a counter, dropping it at zero; false when there was nothing to take
fn decrement(counts: &mut AHashMap<u64, u32>, identity: u64) -> bool {
    match counts.get_mut(&identity) {
        Some(n) if *n > 1 => {
            *n -= 1;
            true
        }
        Some(_) => {
            counts.remove(&identity);
            true
        }
        None => false,
    }
}

impl UrlQueue for IdentityQueue {
    fn offer(&self, url: Hyperlink) -> bool {
        let mut state = self.state.lock();
        if !self.admit(&mut state, url.identity()) {
            return false;
        }
        let len = state.insert(url);
        self.len.store(len, Ordering::Release);
        true
    }

    fn poll(&self) -> Option<Hyperlink> {
        let mut state = self.state.lock();
        let url = state.live.pop_first().map(|(_, url)| url);
        self.len.store(state.live.len(), Ordering::Release);
        url
    }

    fn peek(&self) -> Option<Hyperlink> {
        self.state
            .lock()
            .live
            .first_key_value()
            .map(|(_, url)| url.clone())
    }

    fn size(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.lock();
        let before = state.live.len();
        state.live.retain(|_, url| !url.is_expired(now));
        let after = state.live.len();
        self.len.store(after, Ordering::Release);
        before - after
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.live.clear();
        state.history.clear();
        state.external.clear();
        self.len.store(0, Ordering::Release);
    }

    fn policy(&self) -> RevisitPolicy {
        self.policy
    }
}
