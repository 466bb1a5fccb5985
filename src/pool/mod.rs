//! Priority caches and the pool that registers them
//!
//! This module provides:
//! - `PriorityCache`: the three re-visit queues of one priority level
//! - `DelayCache`: time-gated retry queue
//! - `UrlPool`: ordered, real-time, delay and unordered caches of one frontier

pub mod cache;
pub mod delay_cache;
pub mod url_pool;

pub use cache::PriorityCache;
pub use delay_cache::DelayCache;
pub use url_pool::{REAL_TIME_PRIORITY, UrlPool};
