//! Fair scheduling across many collectors
//!
//! Collectors are grouped into tiers by priority. Each round walks the tiers
//! from most to least urgent, shuffles the tier and pulls from the first
//! collector that has more. The round ends at the first pull that yields
//! anything, so a lower tier is only reached when every higher tier is dry.

use log::debug;
use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::collector::{CollectorCounters, UrlCollector, UrlSink};
use crate::urls::{Hyperlink, Priority13};

pub struct FairMultiSourceCollector {
    name: RwLock<String>,
    collectors: RwLock<Vec<Arc<dyn UrlCollector>>>,
    /// Pulls from collectors at or above this priority are staged at the sink front
    highest_threshold: i32,
    rng: Mutex<StdRng>,
    rounds: AtomicU64,
    counters: CollectorCounters,
}

impl FairMultiSourceCollector {
    /// `seed` fixes the shuffle order; `None` seeds from the OS
    #[must_use]
    pub fn new(highest_threshold: i32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(highest_threshold, rng)
    }

    #[must_use]
    pub fn with_rng(highest_threshold: i32, rng: StdRng) -> Self {
        Self {
            name: RwLock::new("fair".to_string()),
            collectors: RwLock::new(Vec::new()),
            highest_threshold,
            rng: Mutex::new(rng),
            rounds: AtomicU64::new(0),
            counters: CollectorCounters::new(),
        }
    }

    pub fn highest_threshold(&self) -> i32 {
        self.highest_threshold
    }

    pub fn add(&self, collector: Arc<dyn UrlCollector>) {
        self.collectors.write().push(collector);
    }

    pub fn add_all<I>(&self, collectors: I)
    where
        I: IntoIterator<Item = Arc<dyn UrlCollector>>,
    {
        self.collectors.write().extend(collectors);
    }

    /// Snapshot of the registered collectors in registration order
    pub fn collectors(&self) -> Vec<Arc<dyn UrlCollector>> {
        self.collectors.read().clone()
    }

    pub fn len(&self) -> usize {
        self.collectors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.read().is_empty()
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn UrlCollector>> {
        self.collectors
            .read()
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    /// Unregister `collector` by identity
    pub fn remove(&self, collector: &Arc<dyn UrlCollector>) -> bool {
        !self.remove_if(|c| Arc::ptr_eq(c, collector)).is_empty()
    }

    /// Unregister every collector matching `predicate` and return them
    pub fn remove_if<F>(&self, mut predicate: F) -> Vec<Arc<dyn UrlCollector>>
    where
        F: FnMut(&Arc<dyn UrlCollector>) -> bool,
    {
        let mut collectors = self.collectors.write();
        let (removed, kept): (Vec<_>, Vec<_>) =
            collectors.drain(..).partition(|c| predicate(c));
        *collectors = kept;
        removed
    }

    /// Number of fairness rounds run so far
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::Relaxed)
    }

    /// Registered collectors grouped by priority, most urgent tier first
    fn tiers(&self) -> Vec<Vec<Arc<dyn UrlCollector>>> {
        let mut tiers: BTreeMap<i32, Vec<Arc<dyn UrlCollector>>> = BTreeMap::new();
        for collector in self.collectors.read().iter() {
            tiers
                .entry(collector.priority())
                .or_default()
                .push(Arc::clone(collector));
        }
        tiers.into_values().rev().collect()
    }

    fn pull(&self, collector: &Arc<dyn UrlCollector>, sink: &mut dyn UrlSink) -> usize {
        if collector.priority() < self.highest_threshold {
            return collector.collect_to(sink);
        }
        let mut staged: Vec<Hyperlink> = Vec::new();
        let count = collector.collect_to(&mut staged);
        if !staged.is_empty() {
            sink.add_first_all(staged);
        }
        count
    }

    /// One round over every tier; returns whether any collector had more, and the yield
    fn round(
        &self,
        tiers: &mut [Vec<Arc<dyn UrlCollector>>],
        sink: &mut dyn UrlSink,
    ) -> (bool, usize) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
        let mut any_more = false;
        for tier in tiers.iter_mut() {
            tier.shuffle(&mut *self.rng.lock());
            let Some(collector) = tier.iter().find(|c| c.has_more()) else {
                continue;
            };
            any_more = true;
            let count = self.pull(collector, sink);
            if count > 0 {
                return (true, count);
            }
        }
        (any_more, 0)
    }
}

impl UrlCollector for FairMultiSourceCollector {
    fn name(&self) -> String {
        self.name.read().clone()
    }

    fn set_name(&self, name: &str) {
        *self.name.write() = name.to_string();
    }

    /// Priority of the most urgent registered collector
    fn priority(&self) -> i32 {
        self.collectors
            .read()
            .iter()
            .map(|c| c.priority())
            .max()
            .unwrap_or(Priority13::NORMAL.value())
    }

    fn size(&self) -> usize {
        self.collectors.read().iter().map(|c| c.size()).sum()
    }

    fn external_size(&self) -> usize {
        self.collectors.read().iter().map(|c| c.external_size()).sum()
    }

    fn estimated_size(&self) -> usize {
        self.collectors.read().iter().map(|c| c.estimated_size()).sum()
    }

    fn has_more(&self) -> bool {
        self.collectors.read().iter().any(|c| c.has_more())
    }

    fn collect_to(&self, sink: &mut dyn UrlSink) -> usize {
        let mut tiers = self.tiers();
        // A collector can report more and still yield nothing, e.g. a loader
        // that entered its cooldown between the check and the pull.
        let max_rounds = self.len() + 1;

        let mut collected = 0;
        for _ in 0..max_rounds {
            let (any_more, count) = self.round(&mut tiers, sink);
            collected = count;
            if count > 0 || !any_more {
                break;
            }
        }
        if collected == 0 && !tiers.is_empty() {
            debug!("Fair collector {} found nothing to collect", self.name());
        }
        self.counters.record(collected);
        collected
    }

    fn counters(&self) -> &CollectorCounters {
        &self.counters
    }

    fn clear(&self) {
        self.collectors.read().iter().for_each(|c| c.clear());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::QueueCollector;
    use crate::queues::{IdentityQueue, UrlQueue};
    use crate::urls::Hyperlink;

    fn collector(name: &str, priority: i32, items: usize) -> Arc<dyn UrlCollector> {
        let queue: Arc<dyn UrlQueue> = Arc::new(IdentityQueue::reentrant());
        for i in 0..items {
            queue.offer(Hyperlink::parse(&format!("https://{name}.example.com/{i}")).unwrap());
        }
        Arc::new(QueueCollector::new(name, priority, queue))
    }

    fn host(url: &Hyperlink) -> String {
        url.host().unwrap_or_default()
    }

    #[test]
    fn test_higher_tier_drains_first() {
        let fair = FairMultiSourceCollector::new(Priority13::HIGHEST.value(), Some(7));
        fair.add(collector("low", 1, 2));
        fair.add(collector("high", 10, 2));

        let mut sink: Vec<Hyperlink> = Vec::new();
        while fair.collect_to(&mut sink) > 0 {}
        let hosts: Vec<_> = sink.iter().map(host).collect();
        assert_eq!(
            hosts,
            [
                "high.example.com",
                "high.example.com",
                "low.example.com",
                "low.example.com"
            ]
        );
        assert_eq!(fair.counters().collected(), 4);
    }

    #[test]
    fn test_highest_pull_goes_to_front() {
        let fair = FairMultiSourceCollector::new(1000, Some(1));
        fair.add(collector("urgent", 1000, 1));

        let mut sink = vec![Hyperlink::parse("https://staged.example.com/").unwrap()];
        assert_eq!(fair.collect_to(&mut sink), 1);
        assert_eq!(host(&sink[0]), "urgent.example.com");
        assert_eq!(host(&sink[1]), "staged.example.com");
    }

    #[test]
    fn test_empty_returns_zero() {
        let fair = FairMultiSourceCollector::new(6000, Some(1));
        let mut sink: Vec<Hyperlink> = Vec::new();
        assert_eq!(fair.collect_to(&mut sink), 0);
        fair.add(collector("dry", 0, 0));
        assert_eq!(fair.collect_to(&mut sink), 0);
        assert!(!fair.has_more());
    }

    #[test]
    fn test_registry() {
        let fair = FairMultiSourceCollector::new(6000, Some(1));
        let a = collector("a", 0, 1);
        fair.add(Arc::clone(&a));
        fair.add_all([collector("b", 5, 2), collector("c", 5, 0)]);
        assert_eq!(fair.len(), 3);
        assert_eq!(fair.priority(), 5);
        assert_eq!(fair.size(), 3);
        assert!(fair.find("b").is_some());

        assert!(fair.remove(&a));
        assert!(!fair.remove(&a));
        let removed = fair.remove_if(|c| c.priority() == 5);
        assert_eq!(removed.len(), 2);
        assert!(fair.is_empty());
    }
}
