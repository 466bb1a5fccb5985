//! In-process `ExternalUrlLoader`
//!
//! Keeps saved URLs in per-partition FIFO queues. Used by the simulation
//! binary and the test suite, and as a reference for real storage adapters.

use dashmap::DashMap;
use log::debug;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::loader::{ExternalUrlLoader, LoadCooldown, LoaderResult, PartitionKey};
use crate::urls::Hyperlink;

pub struct MemoryUrlLoader {
    store: DashMap<PartitionKey, VecDeque<Hyperlink>>,
    cooldown: LoadCooldown,
    /// Number of loads that actually ran (cooldown passed)
    loads: AtomicUsize,
}

impl MemoryUrlLoader {
    #[must_use]
    pub fn new(load_delay: Duration) -> Self {
        Self {
            store: DashMap::new(),
            cooldown: LoadCooldown::new(load_delay),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Total URLs stored across every partition
    pub fn total_stored(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    pub fn partitions(&self) -> Vec<PartitionKey> {
        self.store.iter().map(|e| e.key().clone()).collect()
    }
}

impl ExternalUrlLoader for MemoryUrlLoader {
    fn cooldown(&self) -> &LoadCooldown {
        &self.cooldown
    }

    fn save(&self, url: &Hyperlink, key: &PartitionKey) -> LoaderResult<()> {
        self.store
            .entry(key.clone())
            .or_default()
            .push_back(url.clone());
        Ok(())
    }

    fn save_all(&self, urls: &[Hyperlink], key: &PartitionKey) -> LoaderResult<usize> {
        let mut entry = self.store.entry(key.clone()).or_default();
        entry.extend(urls.iter().cloned());
        Ok(urls.len())
    }

    fn count_remaining(&self, key: &PartitionKey) -> LoaderResult<usize> {
        Ok(self.store.get(key).map_or(0, |q| q.len()))
    }

    fn load_to(
        &self,
        sink: &mut Vec<Hyperlink>,
        size: usize,
        key: &PartitionKey,
    ) -> LoaderResult<usize> {
        if !self.cooldown.try_begin(key) {
            return Ok(0);
        }
        self.loads.fetch_add(1, Ordering::Relaxed);

        let Some(mut queue) = self.store.get_mut(key) else {
            return Ok(0);
        };
        let n = size.min(queue.len());
        sink.extend(queue.drain(..n));
        debug!("Loaded {n} URLs from memory store for {key}");
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(path: &str) -> Hyperlink {
        Hyperlink::parse(&format!("https://example.com/{path}")).unwrap()
    }

    #[test]
    fn test_save_count_load() {
        let loader = MemoryUrlLoader::new(Duration::from_secs(30));
        let key = PartitionKey::new("job", 0, 0);
        loader.save(&link("a"), &key).unwrap();
        loader
            .save_all(&[link("b"), link("c"), link("d")], &key)
            .unwrap();
        assert_eq!(loader.count_remaining(&key).unwrap(), 4);
        assert!(loader.has_more(&key).unwrap());

        let mut sink = Vec::new();
        assert_eq!(loader.load_to(&mut sink, 3, &key).unwrap(), 3);
        assert_eq!(sink[0].spec(), "https://example.com/a");
        assert_eq!(loader.count_remaining(&key).unwrap(), 1);
    }

    #[test]
    fn test_load_respects_cooldown() {
        let loader = MemoryUrlLoader::new(Duration::from_secs(30));
        let key = PartitionKey::new("job", 0, 0);
        loader.save_all(&[link("a"), link("b")], &key).unwrap();

        let mut sink = Vec::new();
        assert_eq!(loader.load_to(&mut sink, 1, &key).unwrap(), 1);
        assert_eq!(loader.load_to(&mut sink, 1, &key).unwrap(), 0);
        assert_eq!(loader.load_count(), 1);

        loader.expire();
        assert_eq!(loader.load_to(&mut sink, 1, &key).unwrap(), 1);
        assert_eq!(loader.load_count(), 2);
    }

    #[test]
    fn test_partitions_are_isolated() {
        let loader = MemoryUrlLoader::new(Duration::ZERO);
        let a = PartitionKey::new("job", 0, 0);
        let b = PartitionKey::new("job", 0, 1000);
        loader.save(&link("a"), &a).unwrap();
        assert_eq!(loader.count_remaining(&b).unwrap(), 0);
        assert_eq!(loader.total_stored(), 1);
        assert_eq!(loader.partitions(), vec![a]);
    }
}
