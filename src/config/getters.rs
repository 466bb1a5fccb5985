//! Getter methods for `FrontierConfig`

use std::time::Duration;

use super::types::FrontierConfig;

impl FrontierConfig {
    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    #[must_use]
    pub fn realtime_capacity(&self) -> usize {
        self.realtime_capacity
    }

    #[must_use]
    pub fn load_delay(&self) -> Duration {
        Duration::from_secs(self.load_delay_secs)
    }

    #[must_use]
    pub fn load_batch_size(&self) -> usize {
        self.load_batch_size
    }

    #[must_use]
    pub fn low_water_mark(&self) -> usize {
        self.low_water_mark
    }

    #[must_use]
    pub fn n_reentrant_bound(&self) -> u32 {
        self.n_reentrant_bound
    }

    #[must_use]
    pub fn highest_priority_threshold(&self) -> i32 {
        self.highest_priority_threshold
    }

    #[must_use]
    pub fn delay_collector_priority(&self) -> i32 {
        self.delay_collector_priority
    }

    #[must_use]
    pub fn average_fetch_rate(&self) -> f64 {
        self.average_fetch_rate
    }

    #[must_use]
    pub fn shuffle_seed(&self) -> Option<u64> {
        self.shuffle_seed
    }
}
