//! Error types for frontier operations

use thiserror::Error;

/// Result type alias for frontier operations
pub type FrontierResult<T> = Result<T, FrontierError>;

/// Error types for frontier operations
///
/// Loader failures never reach this type: loading queues log them and serve
/// whatever is left locally.
#[derive(Debug, Error)]
pub enum FrontierError {
    /// `next` was called with nothing buffered and nothing left to collect
    #[error("No more URLs in the frontier")]
    Empty,

    /// Collector name pattern did not compile
    #[error("Invalid collector name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Order estimation could not be computed
    #[error("Order estimation failed: {0}")]
    Estimation(String),
}

impl FrontierError {
    /// True when retrying later may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, FrontierError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_error_converts() {
        #[allow(clippy::invalid_regex)]
        let err: FrontierError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, FrontierError::InvalidPattern(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient() {
        assert!(FrontierError::Empty.is_transient());
        let estimation = FrontierError::Estimation("count overflow".into());
        assert!(!estimation.is_transient());
        assert_eq!(estimation.to_string(), "Order estimation failed: count overflow");
    }
}
