//! Shared configuration constants for the frontier
//!
//! Default values used by `FrontierConfig` and the queue/collector constructors,
//! kept in one place to avoid magic numbers.

/// Default local capacity of a loading queue: 10,000 URLs
///
/// Fetching is expensive, so local queues stay shallow and anything beyond
/// this bound is written through to the external loader.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default local capacity of the real-time cache's loading queues
pub const DEFAULT_REALTIME_CAPACITY: usize = 1_000;

/// Default loader cooldown: 30 seconds between two loads of the same partition
pub const DEFAULT_LOAD_DELAY_SECS: u64 = 30;

/// Number of URLs pulled from the external loader per refill
pub const DEFAULT_LOAD_BATCH_SIZE: usize = 100;

/// Loading iterable refills while its buffer holds fewer items than this
pub const DEFAULT_LOW_WATER_MARK: usize = 200;

/// Default re-entry bound for n-reentrant queues
///
/// An identity is accepted `N + 1` times: the first offer plus `N` re-entries.
pub const DEFAULT_N_REENTRANT_BOUND: u32 = 3;

/// Default average fetch rate (URLs per second) used for order estimation
pub const DEFAULT_AVERAGE_FETCH_RATE: f64 = 1.0;

/// Sentinel returned by `estimated_order` when the estimation fails
pub const ESTIMATED_ORDER_FAILURE: i64 = -2;

/// Job id used when none is configured
pub const DEFAULT_JOB_ID: &str = "default";
