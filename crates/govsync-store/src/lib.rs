//! govsync Record Store Boundary
//!
//! The [`RecordStore`] trait is the engine's only view of persistence:
//! readiness, upsert, scope-scoped key listing, scope-checked delete,
//! and a separate surface for scope rows. Canonical-record purge walks
//! `list_keys`/`delete` only, so scope rows are structurally out of its
//! reach.
//!
//! - [`memory`] - In-memory implementation for tests and local runs
//! - [`postgres`] - `sqlx`/Postgres implementation for production

use std::collections::HashSet;

use async_trait::async_trait;

use govsync_core::{CanonicalRecord, RecordKey, Scope, ScopeRecord};

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

/// Canonical record persistence.
///
/// Implementations must make `upsert` idempotent on
/// [`CanonicalRecord::key`]: inserting a key that exists replaces the
/// row, never duplicates it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Cheap readiness probe. Failure means the store is unreachable
    /// and a run must not start.
    async fn check_ready(&self) -> StoreResult<()>;

    /// Insert or replace the record identified by its key.
    async fn upsert(&self, record: &CanonicalRecord) -> StoreResult<()>;

    /// All record keys currently stored for the scope.
    async fn list_keys(&self, scope: &Scope) -> StoreResult<HashSet<RecordKey>>;

    /// Delete one record. The scope is part of the predicate, so a key
    /// accidentally shared across scopes can never delete another
    /// scope's row. Deleting an absent key is not an error.
    async fn delete(&self, scope: &Scope, key: RecordKey) -> StoreResult<()>;

    /// Insert or replace the descriptive row for a scope.
    async fn upsert_scope(&self, record: &ScopeRecord) -> StoreResult<()>;
}
