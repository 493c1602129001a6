//! Feed boundary error types
//!
//! Error definitions with transient/permanent classification so the
//! engine can decide whether a failed fetch is worth retrying on a
//! later run.

use thiserror::Error;

use govsync_core::Scope;

/// Error that can occur while a source feed produces records.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Upstream system is temporarily unavailable.
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// Fetch timed out.
    #[error("fetch timeout after {timeout_secs} seconds")]
    FetchTimeout { timeout_secs: u64 },

    /// The feed does not serve the requested scope.
    #[error("scope {scope} is not served by this feed")]
    ScopeNotServed { scope: Scope },

    /// The upstream payload could not be decoded.
    #[error("malformed payload: {message}")]
    MalformedPayload {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading a local snapshot failed.
    #[error("snapshot read failed: {message}")]
    SnapshotRead {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Scope directory enumeration failed.
    #[error("scope enumeration failed: {message}")]
    EnumerationFailed { message: String },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl FeedError {
    /// Check if this error is transient and a later run may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FeedError::UpstreamUnavailable { .. }
                | FeedError::FetchTimeout { .. }
                | FeedError::EnumerationFailed { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification and log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            FeedError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            FeedError::FetchTimeout { .. } => "FETCH_TIMEOUT",
            FeedError::ScopeNotServed { .. } => "SCOPE_NOT_SERVED",
            FeedError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            FeedError::SnapshotRead { .. } => "SNAPSHOT_READ_FAILED",
            FeedError::EnumerationFailed { .. } => "ENUMERATION_FAILED",
            FeedError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create an upstream unavailable error.
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        FeedError::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Create a malformed payload error.
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        FeedError::MalformedPayload {
            message: message.into(),
            source: None,
        }
    }

    /// Create a malformed payload error with source.
    pub fn malformed_payload_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FeedError::MalformedPayload {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a snapshot read error with source.
    pub fn snapshot_read_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FeedError::SnapshotRead {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an enumeration failed error.
    pub fn enumeration_failed(message: impl Into<String>) -> Self {
        FeedError::EnumerationFailed {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        FeedError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
