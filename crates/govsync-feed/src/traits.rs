//! Core feed traits.
//!
//! [`SourceFeed`] is the boundary between the reconciliation engine and
//! whatever produces inventory records (SDK pullers, snapshot files,
//! in-memory fixtures). [`ScopeDirectory`] enumerates the scopes a run
//! should cover. Both are object-safe so the engine can hold them as
//! `Arc<dyn ...>`.

use async_trait::async_trait;

use govsync_core::{Scope, ScopeRecord, SourceKind, SourceRecord};

use crate::error::FeedResult;

/// A producer of raw inventory records for one [`SourceKind`].
///
/// Implementations must be side-effect free from the engine's point of
/// view: fetching the same scope twice in a row may return different
/// data (upstream moved on) but must not mutate anything the engine
/// observes.
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Short human-readable name used in log fields.
    fn name(&self) -> &str;

    /// The kind of inventory this feed produces.
    fn kind(&self) -> SourceKind;

    /// Whether this feed serves the given scope.
    ///
    /// By default, tenant-wide metadata feeds serve only the global
    /// aggregate and every other kind serves only ordinary scopes.
    fn serves(&self, scope: &Scope) -> bool {
        match self.kind() {
            SourceKind::ScopeMetadata => scope.is_global(),
            _ => !scope.is_global(),
        }
    }

    /// Fetch all records currently present upstream for the scope.
    ///
    /// Every returned record must have `origin_scope` set to the scope
    /// that was asked for; the scope guard checks payload-declared
    /// scopes against it downstream.
    async fn fetch(&self, scope: &Scope) -> FeedResult<Vec<SourceRecord>>;
}

/// Enumerates the ordinary scopes a reconciliation run covers, together
/// with their descriptive rows.
#[async_trait]
pub trait ScopeDirectory: Send + Sync {
    /// List every ordinary scope, with display name and classification.
    async fn list_scopes(&self) -> FeedResult<Vec<ScopeRecord>>;
}
