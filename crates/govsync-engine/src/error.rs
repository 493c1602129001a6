//! Engine error types.
//!
//! Almost everything that can go wrong during a run is absorbed into
//! pass counters; only failures that make the whole run pointless
//! surface here.

use thiserror::Error;

use govsync_feed::FeedError;
use govsync_store::StoreError;

/// Fatal reconciliation run errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The record store failed its readiness probe; nothing was
    /// fetched.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// The scope directory could not be enumerated, so there is no
    /// outer loop to run.
    #[error("scope enumeration failed: {0}")]
    ScopeEnumeration(#[source] FeedError),
}

/// Result type for engine runs.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_cause() {
        let err = EngineError::StoreUnavailable(StoreError::unavailable("connection refused"));
        assert!(err.to_string().contains("store unavailable"));

        let err = EngineError::ScopeEnumeration(FeedError::enumeration_failed("roster missing"));
        assert!(err.to_string().contains("enumeration failed"));
    }
}
