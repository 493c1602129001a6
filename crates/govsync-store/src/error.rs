//! Record store error types.

use thiserror::Error;

use govsync_core::RecordKey;

/// Error that can occur against the canonical record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached at all. The engine treats this as
    /// fatal for the whole run.
    #[error("store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single write (upsert or delete) failed.
    #[error("write failed for {key}: {message}")]
    Write {
        key: RecordKey,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A read query failed.
    #[error("query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A record could not be serialized for storage.
    #[error("serialization failed: {message}")]
    Serialization { message: String },
}

impl StoreError {
    /// True when the store as a whole is unreachable, as opposed to a
    /// single operation failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }

    /// Create an unavailability error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailability error with source.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a write error.
    pub fn write(key: RecordKey, message: impl Into<String>) -> Self {
        StoreError::Write {
            key,
            message: message.into(),
            source: None,
        }
    }

    /// Create a write error with source.
    pub fn write_with_source(
        key: RecordKey,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Write {
            key,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        StoreError::Query {
            message: message.into(),
            source: None,
        }
    }

    /// Create a query error with source.
    pub fn query_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Query {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
