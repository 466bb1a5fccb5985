//! The frontier: submission, consumption and collector management
//!
//! - `UrlFrontier`: the facade producers and fetch workers talk to
//! - `LoadingIterable`: the buffered pull interface
//! - `FrontierError`: error types

pub mod errors;
pub mod loading_iterable;
pub mod url_frontier;

pub use errors::{FrontierError, FrontierResult};
pub use loading_iterable::{Iter, LoadingIterable};
pub use url_frontier::UrlFrontier;
