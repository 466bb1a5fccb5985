//! Type-safe builder for `FrontierConfig` using the typestate pattern
//!
//! The job id is the only required field; `build()` exists only once it is set.

use anyhow::Result;
use std::marker::PhantomData;

use super::types::FrontierConfig;

// Type states for the builder
pub struct WithJobId;

pub struct FrontierConfigBuilder<State = ()> {
    pub(crate) config: FrontierConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for FrontierConfigBuilder<()> {
    fn default() -> Self {
        Self {
            config: FrontierConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl FrontierConfig {
    /// Create a builder for configuring a `FrontierConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> FrontierConfigBuilder<()> {
        FrontierConfigBuilder::default()
    }
}

impl FrontierConfigBuilder<()> {
    pub fn job_id(self, job_id: impl Into<String>) -> FrontierConfigBuilder<WithJobId> {
        let mut config = self.config;
        config.job_id = job_id.into();
        FrontierConfigBuilder {
            config,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when the job id is set
impl FrontierConfigBuilder<WithJobId> {
    pub fn build(self) -> Result<FrontierConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
