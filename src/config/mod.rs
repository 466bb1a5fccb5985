//! Configuration module for the frontier
//!
//! This module provides the `FrontierConfig` struct and its type-safe builder
//! with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{FrontierConfigBuilder, WithJobId};
pub use types::FrontierConfig;
