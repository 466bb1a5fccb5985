//! External URL storage seam
//!
//! The frontier never owns persistent storage. An `ExternalUrlLoader` saves
//! overflowing URLs and pages them back in batches per `PartitionKey`, with a
//! cooldown between two loads of the same partition.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::urls::Hyperlink;

/// Result type alias for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised by an external loader
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Backing store cannot be reached
    #[error("External storage unavailable: {0}")]
    Unavailable(String),

    /// Backing store rejected the operation
    #[error("Storage operation failed for {key}: {message}")]
    Storage { key: String, message: String },

    /// Stored record could not be encoded or decoded
    #[error("Failed to (de)serialize URL record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoaderError {
    /// True when the store may answer on a later attempt
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, LoaderError::Unavailable(_))
    }
}

/// External batch boundary: (job, group, priority)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub job_id: String,
    pub group: u32,
    pub priority: i32,
}

impl PartitionKey {
    #[must_use]
    pub fn new(job_id: impl Into<String>, group: u32, priority: i32) -> Self {
        Self {
            job_id: job_id.into(),
            group,
            priority,
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.job_id, self.group, self.priority)
    }
}

/// Per-partition load cooldown
///
/// A load for a key may start only when `delay` has elapsed since the last
/// load started for that key. `expire()` lets every key load again at once.
#[derive(Debug)]
pub struct LoadCooldown {
    delay: Duration,
    last_load: DashMap<PartitionKey, Instant>,
}

impl LoadCooldown {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_load: DashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// True when a load for `key` may start now
    pub fn is_expired(&self, key: &PartitionKey) -> bool {
        self.last_load
            .get(key)
            .is_none_or(|last| last.elapsed() >= self.delay)
    }

    /// Claim the load slot for `key`; false while cooling down
    pub fn try_begin(&self, key: &PartitionKey) -> bool {
        let now = Instant::now();
        match self.last_load.entry(key.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                true
            }
            Entry::Occupied(mut occupied) => {
                if now.saturating_duration_since(*occupied.get()) >= self.delay {
                    occupied.insert(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn expire(&self) {
        self.last_load.clear();
    }

    pub fn expire_key(&self, key: &PartitionKey) {
        self.last_load.remove(key);
    }
}

/// Storage collaborator that saves and batch-loads URLs per partition
///
/// Implementations may block on I/O; only the calling consumer is blocked.
pub trait ExternalUrlLoader: Send + Sync {
    fn cooldown(&self) -> &LoadCooldown;

    fn load_delay(&self) -> Duration {
        self.cooldown().delay()
    }

    /// True when the cooldown for `key` has elapsed
    fn is_expired(&self, key: &PartitionKey) -> bool {
        self.cooldown().is_expired(key)
    }

    /// Force the cooldown of every partition to elapse immediately
    fn expire(&self) {
        self.cooldown().expire();
    }

    fn reset(&self) {
        self.expire();
    }

    fn save(&self, url: &Hyperlink, key: &PartitionKey) -> LoaderResult<()>;

    fn save_all(&self, urls: &[Hyperlink], key: &PartitionKey) -> LoaderResult<usize> {
        for url in urls {
            self.save(url, key)?;
        }
        Ok(urls.len())
    }

    fn has_more(&self, key: &PartitionKey) -> LoaderResult<bool> {
        Ok(self.estimate_remaining(key)? > 0)
    }

    /// Exact number of stored URLs for `key`; may be slow
    fn count_remaining(&self, key: &PartitionKey) -> LoaderResult<usize>;

    /// Fast approximation of `count_remaining`
    fn estimate_remaining(&self, key: &PartitionKey) -> LoaderResult<usize> {
        self.count_remaining(key)
    }

    /// Move at most `size` URLs of `key` into `sink`
    ///
    /// Returns 0 without touching storage while `key` is cooling down.
    fn load_to(
        &self,
        sink: &mut Vec<Hyperlink>,
        size: usize,
        key: &PartitionKey,
    ) -> LoaderResult<usize>;
}
