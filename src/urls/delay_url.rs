//! URLs scheduled for a later retry

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use super::hyperlink::Hyperlink;

static DELAY_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Ready instant used when `now + delay` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A URL that becomes available only after its delay has elapsed
///
/// Ordered by `ready_at`, earliest first; equal instants keep insertion order.
#[derive(Debug, Clone)]
pub struct DelayUrl {
    url: Hyperlink,
    delay: Duration,
    ready_at: Instant,
    sequence: u64,
}

impl DelayUrl {
    #[must_use]
    pub fn new(url: Hyperlink, delay: Duration) -> Self {
        Self::ready_from(url, delay, Instant::now())
    }

    /// Build with an explicit reference instant
    #[must_use]
    pub fn ready_from(url: Hyperlink, delay: Duration, now: Instant) -> Self {
        Self {
            url,
            delay,
            ready_at: now
                .checked_add(delay)
                .or_else(|| now.checked_add(FAR_FUTURE))
                .unwrap_or(now),
            sequence: DELAY_SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed),
        }
    }

    pub fn url(&self) -> &Hyperlink {
        &self.url
    }

    pub fn into_url(self) -> Hyperlink {
        self.url
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn ready_at(&self) -> Instant {
        self.ready_at
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        self.ready_at <= now
    }

    /// Time left until ready, zero once ready
    pub fn remaining(&self, now: Instant) -> Duration {
        self.ready_at.saturating_duration_since(now)
    }
}

impl PartialEq for DelayUrl {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DelayUrl {}

impl Ord for DelayUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ready_at
            .cmp(&other.ready_at)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for DelayUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(path: &str) -> Hyperlink {
        Hyperlink::parse(&format!("https://example.com/{path}")).unwrap()
    }

    #[test]
    fn test_readiness() {
        let now = Instant::now();
        let d = DelayUrl::ready_from(link("a"), Duration::from_secs(2), now);
        assert!(!d.is_ready(now));
        assert!(d.is_ready(now + Duration::from_secs(2)));
        assert_eq!(d.remaining(now), Duration::from_secs(2));
        assert_eq!(d.remaining(now + Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_ordering_by_ready_at() {
        let now = Instant::now();
        let later = DelayUrl::ready_from(link("a"), Duration::from_secs(10), now);
        let sooner = DelayUrl::ready_from(link("b"), Duration::from_secs(1), now);
        assert!(sooner < later);

        let first = DelayUrl::ready_from(link("c"), Duration::ZERO, now);
        let second = DelayUrl::ready_from(link("d"), Duration::ZERO, now);
        assert!(first < second);
    }

    #[test]
    fn test_unrepresentable_delay_saturates() {
        let now = Instant::now();
        let d = DelayUrl::ready_from(link("never"), Duration::MAX, now);
        assert_eq!(d.delay(), Duration::MAX);
        assert!(!d.is_ready(now + Duration::from_secs(365 * 24 * 60 * 60)));
    }
}
