//! Builder methods available for all states

use std::time::Duration;

use super::builder::FrontierConfigBuilder;

impl<State> FrontierConfigBuilder<State> {
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn realtime_capacity(mut self, capacity: usize) -> Self {
        self.config.realtime_capacity = capacity;
        self
    }

    /// Set the loader cooldown, truncated to whole seconds
    #[must_use]
    pub fn load_delay(mut self, delay: Duration) -> Self {
        self.config.load_delay_secs = delay.as_secs();
        self
    }

    #[must_use]
    pub fn load_batch_size(mut self, size: usize) -> Self {
        self.config.load_batch_size = size;
        self
    }

    #[must_use]
    pub fn low_water_mark(mut self, mark: usize) -> Self {
        self.config.low_water_mark = mark;
        self
    }

    #[must_use]
    pub fn n_reentrant_bound(mut self, n: u32) -> Self {
        self.config.n_reentrant_bound = n;
        self
    }

    #[must_use]
    pub fn highest_priority_threshold(mut self, priority: impl Into<i32>) -> Self {
        self.config.highest_priority_threshold = priority.into();
        self
    }

    #[must_use]
    pub fn delay_collector_priority(mut self, priority: impl Into<i32>) -> Self {
        self.config.delay_collector_priority = priority.into();
        self
    }

    /// Average URLs fetched per second, used to project delay-cache readiness
    #[must_use]
    pub fn average_fetch_rate(mut self, rate: f64) -> Self {
        self.config.average_fetch_rate = rate;
        self
    }

    /// Make the fairness shuffle deterministic
    #[must_use]
    pub fn shuffle_seed(mut self, seed: u64) -> Self {
        self.config.shuffle_seed = Some(seed);
        self
    }
}
