//! Multi-policy URL frontier
//!
//! Decides the order in which submitted URLs are handed to fetch workers:
//! per-priority caches with re-visit policies, a delay cache for retries,
//! fair collection across sources and loading queues that extend small local
//! queues with batches paged in from external storage.

pub mod collect;
pub mod config;
pub mod frontier;
pub mod pool;
pub mod queues;
pub mod urls;
pub mod utils;

pub use collect::{
    CacheCollector, CollectorsFormatter, DelayCacheCollector, FairMultiSourceCollector,
    QueueCollector, UrlCollector, UrlSink,
};
pub use config::FrontierConfig;
pub use frontier::{FrontierError, FrontierResult, LoadingIterable, UrlFrontier};
pub use pool::{DelayCache, PriorityCache, UrlPool};
pub use queues::{
    ExternalUrlLoader, IdentityQueue, LoaderError, LoaderResult, LoadingQueue, MemoryUrlLoader,
    PartitionKey, RevisitPolicy, UrlQueue,
};
pub use urls::{DelayUrl, Hyperlink, Priority13};
