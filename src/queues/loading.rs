//! Identity queue extended by an external loader
//!
//! The local queue stays shallow. When it is full, offers are written through
//! to the loader; when it runs dry, a batch is paged back in, at most once per
//! loader cooldown. Overflow passes the local re-visit policy before it is
//! written out, and a copy admitted that way is let back in when paged in.
//! Loader failures are logged and treated as "nothing to load
//! this round"; the next `has_more`/`poll` tries again.

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use std::sync::Arc;

use super::identity::{IdentityQueue, RevisitPolicy};
use super::loader::{ExternalUrlLoader, PartitionKey};
use super::UrlQueue;
use crate::urls::Hyperlink;
use crate::utils::DEFAULT_LOAD_BATCH_SIZE;

/// Transform applied to every URL paged in from external storage
pub type LoadTransformer = Arc<dyn Fn(Hyperlink) -> Hyperlink + Send + Sync>;

pub struct LoadingQueue {
    local: IdentityQueue,
    loader: Arc<dyn ExternalUrlLoader>,
    key: PartitionKey,
    capacity: usize,
    batch_size: usize,
    transformer: Option<LoadTransformer>,
}

impl LoadingQueue {
    #[must_use]
    pub fn new(
        local: IdentityQueue,
        loader: Arc<dyn ExternalUrlLoader>,
        key: PartitionKey,
        capacity: usize,
    ) -> Self {
        Self {
            local,
            loader,
            key,
            capacity,
            batch_size: DEFAULT_LOAD_BATCH_SIZE,
            transformer: None,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_transformer(mut self, transformer: LoadTransformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn key(&self) -> &PartitionKey {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.local.size() >= self.capacity
    }

    /// Page in up to one batch if the local queue is empty and the loader is not cooling down
    ///
    /// Returns the number of URLs accepted into the local queue.
    pub fn load_now(&self) -> usize {
        if self.local.size() > 0 || !self.loader.is_expired(&self.key) {
            return 0;
        }

        let room = self.capacity.saturating_sub(self.local.size());
        let size = self.batch_size.min(room);
        if size == 0 {
            return 0;
        }

        let mut batch = Vec::with_capacity(size);
        if let Err(e) = self.loader.load_to(&mut batch, size, &self.key) {
            if e.is_transient() {
                warn!("Failed to load URLs for {}, will retry: {e}", self.key);
            } else {
                error!("Failed to load URLs for {}: {e}", self.key);
            }
            return 0;
        }

        let loaded = batch.len();
        let accepted = batch
            .into_iter()
            .map(|url| match &self.transformer {
                Some(transform) => transform(url),
                None => url,
            })
            .filter(|url| self.local.offer_loaded(url.clone()))
            .count();
        if loaded > 0 {
            debug!("Paged in {accepted}/{loaded} URLs for {}", self.key);
        }
        accepted
    }
}

impl UrlQueue for LoadingQueue {
    fn offer(&self, url: Hyperlink) -> bool {
        if !self.is_full() {
            return self.local.offer(url);
        }
        if !self.local.admit_external(&url) {
            return false;
        }

        match self.loader.save(&url, &self.key) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save overflow URL {url} for {}: {e}", self.key);
                self.local.revoke_external(url.identity());
                false
            }
        }
    }

    fn poll(&self) -> Option<Hyperlink> {
        if let Some(url) = self.local.poll() {
            return Some(url);
        }
        self.load_now();
        self.local.poll()
    }

    fn peek(&self) -> Option<Hyperlink> {
        self.local.peek()
    }

    fn size(&self) -> usize {
        self.local.size()
    }

    fn has_more(&self) -> bool {
        if self.local.size() > 0 {
            return true;
        }
        if !self.loader.is_expired(&self.key) {
            return false;
        }
        match self.loader.has_more(&self.key) {
            Ok(more) => more,
            Err(e) => {
                warn!("Failed to query remaining URLs for {}: {e}", self.key);
                false
            }
        }
    }

    fn external_size(&self) -> usize {
        self.loader.count_remaining(&self.key).unwrap_or_else(|e| {
            warn!("Failed to count external URLs for {}: {e}", self.key);
            0
        })
    }

    fn estimated_external_size(&self) -> usize {
        self.loader.estimate_remaining(&self.key).unwrap_or_else(|e| {
            warn!("Failed to estimate external URLs for {}: {e}", self.key);
            0
        })
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        self.local.remove_expired(now)
    }

    fn clear(&self) {
        self.local.clear();
    }

    /// Clears local state and the cooldown; external storage is left alone
    fn deep_clear(&self) {
        self.local.clear();
        self.loader.cooldown().expire_key(&self.key);
    }

    fn policy(&self) -> RevisitPolicy {
        self.local.policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::MemoryUrlLoader;
    use std::time::Duration;

    fn link(path: &str) -> Hyperlink {
        Hyperlink::parse(&format!("https://example.com/{path}")).unwrap()
    }

    fn queue(loader: Arc<MemoryUrlLoader>, capacity: usize) -> LoadingQueue {
        LoadingQueue::new(
            IdentityQueue::reentrant(),
            loader,
            PartitionKey::new("job", 2, 0),
            capacity,
        )
    }

    #[test]
    fn test_overflow_goes_external() {
        let loader = Arc::new(MemoryUrlLoader::new(Duration::from_secs(30)));
        let q = queue(loader.clone(), 2);
        for p in ["a", "b", "c", "d"] {
            assert!(q.offer(link(p)));
        }
        assert_eq!(q.size(), 2);
        assert_eq!(q.external_size(), 2);
        assert_eq!(q.estimated_size(), 4);
    }

    #[test]
    fn test_poll_refills_from_loader() {
        let loader = Arc::new(MemoryUrlLoader::new(Duration::from_secs(30)));
        let q = queue(loader.clone(), 1).with_batch_size(10);
        q.offer(link("a"));
        q.offer(link("b"));
        q.offer(link("c"));

        assert_eq!(q.poll().unwrap().spec(), "https://example.com/a");
        // capacity bounds the batch
        assert_eq!(q.poll().unwrap().spec(), "https://example.com/b");
        // cooling down now
        assert!(q.poll().is_none());
        assert!(!q.has_more());
        assert_eq!(q.external_size(), 1);

        loader.expire();
        assert!(q.has_more());
        assert_eq!(q.poll().unwrap().spec(), "https://example.com/c");
    }

    #[test]
    fn test_transformer_applies_to_loaded_items() {
        let loader = Arc::new(MemoryUrlLoader::new(Duration::ZERO));
        let key = PartitionKey::new("job", 2, 0);
        loader.save(&link("x"), &key).unwrap();
        let q = LoadingQueue::new(IdentityQueue::reentrant(), loader, key, 10)
            .with_transformer(Arc::new(|url: Hyperlink| url.with_args("-loaded")));
        assert_eq!(q.poll().unwrap().args(), "-loaded");
    }

    #[test]
    fn test_deep_clear_keeps_external() {
        let loader = Arc::new(MemoryUrlLoader::new(Duration::from_secs(30)));
        let q = queue(loader.clone(), 1);
        q.offer(link("a"));
        q.offer(link("b"));
        q.deep_clear();
        assert_eq!(q.size(), 0);
        assert_eq!(q.external_size(), 1);
        assert!(q.has_more());
    }
}
