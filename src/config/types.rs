//! Core configuration types for the frontier
//!
//! `FrontierConfig` holds every tunable of the scheduling core. All fields have
//! defaults, so a partial JSON document is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::urls::Priority13;
use crate::utils::{
    DEFAULT_AVERAGE_FETCH_RATE, DEFAULT_CACHE_CAPACITY, DEFAULT_JOB_ID, DEFAULT_LOAD_BATCH_SIZE,
    DEFAULT_LOAD_DELAY_SECS, DEFAULT_LOW_WATER_MARK, DEFAULT_N_REENTRANT_BOUND,
    DEFAULT_REALTIME_CAPACITY,
};

/// Main configuration struct for the URL frontier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    /// Job component of every partition key
    pub(crate) job_id: String,

    /// Local bound of each loading queue; overflow is saved to the loader
    pub(crate) cache_capacity: usize,

    /// Local bound of the real-time cache's loading queues
    pub(crate) realtime_capacity: usize,

    /// Cooldown in seconds between two loads of the same partition
    pub(crate) load_delay_secs: u64,

    /// URLs pulled from the loader per refill
    pub(crate) load_batch_size: usize,

    /// The loading iterable refills while its buffer holds fewer items than this
    pub(crate) low_water_mark: usize,

    /// Re-entries allowed by n-reentrant queues
    pub(crate) n_reentrant_bound: u32,

    /// Pulls from collectors at or above this priority are staged at the buffer front
    pub(crate) highest_priority_threshold: i32,

    /// Priority reported by the delay cache collector
    pub(crate) delay_collector_priority: i32,

    /// Average fetch rate in URLs per second, used by order estimation
    pub(crate) average_fetch_rate: f64,

    /// Fixed seed for the fairness shuffle; random when unset
    pub(crate) shuffle_seed: Option<u64>,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            job_id: DEFAULT_JOB_ID.to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            realtime_capacity: DEFAULT_REALTIME_CAPACITY,
            load_delay_secs: DEFAULT_LOAD_DELAY_SECS,
            load_batch_size: DEFAULT_LOAD_BATCH_SIZE,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
            n_reentrant_bound: DEFAULT_N_REENTRANT_BOUND,
            highest_priority_threshold: Priority13::HIGHEST.value(),
            delay_collector_priority: Priority13::HIGHER.value(),
            average_fetch_rate: DEFAULT_AVERAGE_FETCH_RATE,
            shuffle_seed: None,
        }
    }
}

impl FrontierConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Invalid frontier config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.job_id.is_empty() {
            anyhow::bail!("job_id must not be empty");
        }
        if self.load_batch_size == 0 {
            anyhow::bail!("load_batch_size must be positive");
        }
        if self.low_water_mark == 0 {
            anyhow::bail!("low_water_mark must be positive");
        }
        if self.cache_capacity == 0 || self.realtime_capacity == 0 {
            anyhow::bail!("cache capacities must be positive");
        }
        if !(self.average_fetch_rate.is_finite() && self.average_fetch_rate > 0.0) {
            anyhow::bail!(
                "average_fetch_rate must be a positive number, got {}",
                self.average_fetch_rate
            );
        }
        Ok(())
    }
}
