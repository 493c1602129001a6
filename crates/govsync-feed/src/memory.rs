//! In-memory feed and directory implementations.
//!
//! [`StaticFeed`] serves a fixed set of records per scope and supports
//! failure injection and fetch counting; it is the standard test double
//! and also useful for local wiring. Record sets can be swapped between
//! runs, which is how convergence scenarios (upstream shrinks, purge
//! catches up) are exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use govsync_core::{Scope, ScopeRecord, SourceKind, SourceRecord};

use crate::error::{FeedError, FeedResult};
use crate::traits::{ScopeDirectory, SourceFeed};

/// A [`SourceFeed`] backed by an in-memory map of scope to records.
pub struct StaticFeed {
    name: String,
    kind: SourceKind,
    records: RwLock<HashMap<Scope, Vec<SourceRecord>>>,
    fail: AtomicBool,
    fetch_count: AtomicUsize,
}

impl StaticFeed {
    /// Create an empty feed for the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            records: RwLock::new(HashMap::new()),
            fail: AtomicBool::new(false),
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Builder-style: seed the records for one scope.
    #[must_use]
    pub fn with_records(self, scope: Scope, records: Vec<SourceRecord>) -> Self {
        self.set_records(scope, records);
        self
    }

    /// Builder-style: seed payloads for one scope, wrapping each in a
    /// [`SourceRecord`] with no raw identifier extraction applied.
    #[must_use]
    pub fn with_payloads(self, scope: Scope, payloads: Vec<Value>) -> Self {
        let records = payloads
            .into_iter()
            .map(|payload| {
                let raw_id = payload
                    .get("name")
                    .and_then(Value::as_str)
                    .map(String::from);
                SourceRecord {
                    kind: self.kind,
                    origin_scope: scope,
                    raw_id,
                    payload,
                }
            })
            .collect();
        self.set_records(scope, records);
        self
    }

    /// Replace the record set for a scope (simulates upstream change
    /// between runs).
    pub fn set_records(&self, scope: Scope, records: Vec<SourceRecord>) {
        if let Ok(mut map) = self.records.write() {
            map.insert(scope, records);
        }
    }

    /// Make every subsequent fetch fail with a transient error.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Number of fetches served (including failed ones).
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFeed for StaticFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, scope: &Scope) -> FeedResult<Vec<SourceRecord>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(FeedError::upstream_unavailable(format!(
                "{} feed set to fail",
                self.name
            )));
        }

        let records = self
            .records
            .read()
            .map_err(|_| FeedError::internal("records lock poisoned"))?
            .get(scope)
            .cloned()
            .unwrap_or_default();
        Ok(records)
    }
}

/// A [`ScopeDirectory`] backed by a fixed list of scope rows.
pub struct StaticScopeDirectory {
    scopes: RwLock<Vec<ScopeRecord>>,
    fail: AtomicBool,
}

impl StaticScopeDirectory {
    /// Create a directory over the given scope rows.
    #[must_use]
    pub fn new(scopes: Vec<ScopeRecord>) -> Self {
        Self {
            scopes: RwLock::new(scopes),
            fail: AtomicBool::new(false),
        }
    }

    /// Make enumeration fail with a transient error.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScopeDirectory for StaticScopeDirectory {
    async fn list_scopes(&self) -> FeedResult<Vec<ScopeRecord>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(FeedError::enumeration_failed(
                "directory set to fail".to_string(),
            ));
        }
        self.scopes
            .read()
            .map(|scopes| scopes.clone())
            .map_err(|_| FeedError::internal("scopes lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govsync_core::ScopeId;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_feed_serves_seeded_records() {
        let scope = Scope::Ordinary(ScopeId::new());
        let feed = StaticFeed::new("apps", SourceKind::Application).with_payloads(
            scope,
            vec![json!({"name": "app-1"}), json!({"name": "app-2"})],
        );

        let records = feed.fetch(&scope).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].raw_id.as_deref(), Some("app-1"));
        assert_eq!(feed.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_static_feed_unknown_scope_is_empty() {
        let feed = StaticFeed::new("apps", SourceKind::Application);
        let records = feed.fetch(&Scope::Ordinary(ScopeId::new())).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_static_feed_failure_injection() {
        let scope = Scope::Ordinary(ScopeId::new());
        let feed = StaticFeed::new("flows", SourceKind::Workflow);
        feed.set_failing(true);

        let err = feed.fetch(&scope).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(feed.fetch_count(), 1);

        feed.set_failing(false);
        assert!(feed.fetch(&scope).await.is_ok());
    }

    #[tokio::test]
    async fn test_static_directory_lists_and_fails() {
        let rows = vec![ScopeRecord {
            scope: Scope::Ordinary(ScopeId::new()),
            display_name: "Production".to_string(),
            class: Some("Production".to_string()),
            region: Some("europe".to_string()),
            provisioning_state: Some("Succeeded".to_string()),
            is_default: true,
            metadata: None,
        }];
        let dir = StaticScopeDirectory::new(rows.clone());

        assert_eq!(dir.list_scopes().await.unwrap(), rows);

        dir.set_failing(true);
        assert!(dir.list_scopes().await.is_err());
    }
}
