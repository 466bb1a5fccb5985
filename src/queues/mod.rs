//! URL queues
//!
//! `UrlQueue` is the contract shared by the three identity queues and the
//! externally backed `LoadingQueue`. Priority caches hold queues through it.

use chrono::{DateTime, Utc};

use crate::urls::Hyperlink;

pub mod identity;
pub mod loader;
pub mod loading;
pub mod memory_loader;

pub use identity::{IdentityQueue, RevisitPolicy};
pub use loader::{ExternalUrlLoader, LoadCooldown, LoaderError, LoaderResult, PartitionKey};
pub use loading::{LoadTransformer, LoadingQueue};
pub use memory_loader::MemoryUrlLoader;

/// A concurrent, ordered URL queue
///
/// Size reads are lock-free snapshots and may lag concurrent mutations.
pub trait UrlQueue: Send + Sync {
    /// Insert `url`; false when the re-visit policy rejects it
    fn offer(&self, url: Hyperlink) -> bool;

    /// Remove and return the URL with the smallest order key
    fn poll(&self) -> Option<Hyperlink>;

    fn peek(&self) -> Option<Hyperlink>;

    /// Number of URLs held locally
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// True when a `poll` may yield a URL, locally or after a load
    fn has_more(&self) -> bool {
        self.size() > 0
    }

    fn external_size(&self) -> usize {
        0
    }

    fn estimated_external_size(&self) -> usize {
        0
    }

    fn estimated_size(&self) -> usize {
        self.size() + self.estimated_external_size()
    }

    /// Purge URLs whose deadline has passed; returns how many were removed
    fn remove_expired(&self, now: DateTime<Utc>) -> usize;

    fn clear(&self);

    fn deep_clear(&self) {
        self.clear();
    }

    fn policy(&self) -> RevisitPolicy;
}
