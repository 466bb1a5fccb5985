//! Collectors: bounded, non-blocking pulls from pool caches and queues
//!
//! This module provides:
//! - `UrlCollector` and `UrlSink`: the pull contract
//! - `CacheCollector`, `QueueCollector`, `DelayCacheCollector`: single-source collectors
//! - `FairMultiSourceCollector`: priority tiers with randomized rotation inside a tier
//! - `CollectorsFormatter`: textual report of collector state

pub mod cache_collector;
pub mod collector;
pub mod delay_collector;
pub mod fair;
pub mod formatter;
pub mod queue_collector;

pub use cache_collector::CacheCollector;
pub use collector::{CollectorCounters, CollectorStats, UrlCollector, UrlSink};
pub use delay_collector::DelayCacheCollector;
pub use fair::FairMultiSourceCollector;
pub use formatter::CollectorsFormatter;
pub use queue_collector::QueueCollector;
