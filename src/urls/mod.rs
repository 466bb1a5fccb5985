//! URL model
//!
//! `Hyperlink` is the unit of scheduling, `Priority13` the fixed priority
//! scale and `DelayUrl` the retry wrapper held by the delay cache.

pub mod delay_url;
pub mod hyperlink;
pub mod priority;

pub use delay_url::DelayUrl;
pub use hyperlink::{Hyperlink, OrderKey};
pub use priority::Priority13;
