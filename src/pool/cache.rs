//! Priority caches
//!
//! A `PriorityCache` groups the three re-visit disciplines for one priority
//! level. Its size is always the sum of its three queues.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::FrontierConfig;
use crate::queues::{
    ExternalUrlLoader, IdentityQueue, LoadingQueue, PartitionKey, RevisitPolicy, UrlQueue,
};

/// Partition groups of the three queues of a loading cache
const NON_REENTRANT_GROUP: u32 = 0;
const N_REENTRANT_GROUP: u32 = 1;
const REENTRANT_GROUP: u32 = 2;

pub struct PriorityCache {
    name: String,
    priority: i32,
    non_reentrant: Arc<dyn UrlQueue>,
    n_reentrant: Arc<dyn UrlQueue>,
    reentrant: Arc<dyn UrlQueue>,
}

impl PriorityCache {
    pub fn from_queues(
        name: impl Into<String>,
        priority: i32,
        non_reentrant: Arc<dyn UrlQueue>,
        n_reentrant: Arc<dyn UrlQueue>,
        reentrant: Arc<dyn UrlQueue>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            non_reentrant,
            n_reentrant,
            reentrant,
        }
    }

    /// In-memory cache backed by plain identity queues
    pub fn concurrent(name: impl Into<String>, priority: i32, n_reentrant_bound: u32) -> Self {
        Self::from_queues(
            name,
            priority,
            Arc::new(IdentityQueue::non_reentrant()),
            Arc::new(IdentityQueue::n_reentrant(n_reentrant_bound)),
            Arc::new(IdentityQueue::reentrant()),
        )
    }

    /// Cache whose three queues page in from `loader`, one partition each
    pub fn loading(
        name: impl Into<String>,
        priority: i32,
        loader: Arc<dyn ExternalUrlLoader>,
        capacity: usize,
        config: &FrontierConfig,
    ) -> Self {
        let queue = |local: IdentityQueue, group: u32| -> Arc<dyn UrlQueue> {
            let key = PartitionKey::new(config.job_id(), group, priority);
            Arc::new(
                LoadingQueue::new(local, Arc::clone(&loader), key, capacity)
                    .with_batch_size(config.load_batch_size()),
            )
        };

        Self::from_queues(
            name,
            priority,
            queue(IdentityQueue::non_reentrant(), NON_REENTRANT_GROUP),
            queue(
                IdentityQueue::n_reentrant(config.n_reentrant_bound()),
                N_REENTRANT_GROUP,
            ),
            queue(IdentityQueue::reentrant(), REENTRANT_GROUP),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn non_reentrant_queue(&self) -> &Arc<dyn UrlQueue> {
        &self.non_reentrant
    }

    pub fn n_reentrant_queue(&self) -> &Arc<dyn UrlQueue> {
        &self.n_reentrant
    }

    pub fn reentrant_queue(&self) -> &Arc<dyn UrlQueue> {
        &self.reentrant
    }

    /// The queue holding the given discipline
    pub fn queue(&self, policy: RevisitPolicy) -> &Arc<dyn UrlQueue> {
        match policy {
            RevisitPolicy::NonReentrant => &self.non_reentrant,
            RevisitPolicy::NReentrant(_) => &self.n_reentrant,
            RevisitPolicy::Reentrant => &self.reentrant,
        }
    }

    /// Queues in polling order
    pub fn queues(&self) -> [&Arc<dyn UrlQueue>; 3] {
        [&self.non_reentrant, &self.n_reentrant, &self.reentrant]
    }

    pub fn size(&self) -> usize {
        self.queues().iter().map(|q| q.size()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn external_size(&self) -> usize {
        self.queues().iter().map(|q| q.external_size()).sum()
    }

    pub fn estimated_external_size(&self) -> usize {
        self.queues()
            .iter()
            .map(|q| q.estimated_external_size())
            .sum()
    }

    pub fn estimated_size(&self) -> usize {
        self.size() + self.estimated_external_size()
    }

    pub fn has_more(&self) -> bool {
        self.queues().iter().any(|q| q.has_more())
    }

    /// Purge URLs past their deadline from all three queues
    pub fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        self.queues().iter().map(|q| q.remove_expired(now)).sum()
    }

    pub fn clear(&self) {
        self.queues().iter().for_each(|q| q.clear());
    }

    pub fn deep_clear(&self) {
        self.queues().iter().for_each(|q| q.deep_clear());
    }
}

impl std::fmt::Debug for PriorityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityCache")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::MemoryUrlLoader;
    use crate::urls::Hyperlink;
    use chrono::Duration;

    fn link(path: &str) -> Hyperlink {
        Hyperlink::parse(&format!("https://example.com/{path}")).unwrap()
    }

    #[test]
    fn test_size_is_sum_of_queues() {
        let cache = PriorityCache::concurrent("normal", 0, 3);
        cache.non_reentrant_queue().offer(link("a"));
        cache.n_reentrant_queue().offer(link("b"));
        cache.n_reentrant_queue().offer(link("b"));
        cache.reentrant_queue().offer(link("c"));
        assert_eq!(cache.size(), 4);
        assert!(cache.has_more());
    }

    #[test]
    fn test_non_reentrant_history_survives_poll() {
        let cache = PriorityCache::concurrent("normal", 0, 3);
        assert!(cache.non_reentrant_queue().offer(link("a")));
        cache.non_reentrant_queue().poll();
        assert!(!cache.non_reentrant_queue().offer(link("a")));
        cache.clear();
        assert!(cache.non_reentrant_queue().offer(link("a")));
    }

    #[test]
    fn test_remove_expired_across_queues() {
        let cache = PriorityCache::concurrent("normal", 0, 3);
        let now = Utc::now();
        let past = now - Duration::seconds(10);
        cache.non_reentrant_queue().offer(link("a").with_deadline(past));
        cache.n_reentrant_queue().offer(link("b").with_deadline(past));
        cache.reentrant_queue().offer(link("c"));
        assert_eq!(cache.remove_expired(now), 2);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_loading_cache_partitions() {
        let config = FrontierConfig::default();
        let loader = Arc::new(MemoryUrlLoader::new(std::time::Duration::from_secs(30)));
        let cache = PriorityCache::loading("higher", 1000, loader.clone(), 1, &config);
        cache.reentrant_queue().offer(link("a"));
        cache.reentrant_queue().offer(link("b"));
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.external_size(), 1);
        assert_eq!(cache.estimated_size(), 2);
        assert_eq!(
            loader.partitions(),
            vec![PartitionKey::new(config.job_id(), REENTRANT_GROUP, 1000)]
        );
    }
}
