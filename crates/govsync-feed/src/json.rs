//! JSON snapshot feeds.
//!
//! [`JsonDirFeed`] serves records from a directory of JSON snapshot
//! files laid out as `<root>/<kind>/<scope>.json`, each file holding a
//! JSON array of raw payloads. [`JsonScopeDirectory`] reads the scope
//! roster from `<root>/scopes.json`. Snapshot directories are produced
//! by whatever pulls upstream inventory; serving them keeps the engine
//! independent of upstream SDKs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use govsync_core::{Scope, ScopeRecord, SourceKind, SourceRecord};

use crate::error::{FeedError, FeedResult};
use crate::traits::{ScopeDirectory, SourceFeed};

/// Payload fields tried in order when extracting a raw identifier.
const RAW_ID_FIELDS: [&str; 5] = ["name", "workflowid", "canvasappid", "solutionid", "id"];

fn extract_raw_id(payload: &Value) -> Option<String> {
    for field in RAW_ID_FIELDS {
        if let Some(value) = payload.get(field) {
            match value {
                Value::String(s) if !s.is_empty() => return Some(s.clone()),
                Value::Number(n) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

/// A [`SourceFeed`] reading one kind's snapshots from disk.
pub struct JsonDirFeed {
    name: String,
    kind: SourceKind,
    root: PathBuf,
}

impl JsonDirFeed {
    /// Create a feed rooted at a snapshot directory.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SourceKind, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            root: root.into(),
        }
    }

    fn snapshot_path(&self, scope: &Scope) -> PathBuf {
        self.root
            .join(self.kind.as_str())
            .join(format!("{scope}.json"))
    }
}

#[async_trait]
impl SourceFeed for JsonDirFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, scope: &Scope) -> FeedResult<Vec<SourceRecord>> {
        let path = self.snapshot_path(scope);

        // A missing snapshot means the upstream pull saw nothing for
        // this scope, not an error.
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            FeedError::snapshot_read_with_source(format!("reading {}", path.display()), e)
        })?;

        let payloads: Vec<Value> = serde_json::from_str(&raw).map_err(|e| {
            FeedError::malformed_payload_with_source(
                format!("{} is not a JSON array", path.display()),
                e,
            )
        })?;

        Ok(payloads
            .into_iter()
            .map(|payload| SourceRecord {
                kind: self.kind,
                origin_scope: *scope,
                raw_id: extract_raw_id(&payload),
                payload,
            })
            .collect())
    }
}

/// A [`ScopeDirectory`] reading the scope roster from `scopes.json`.
pub struct JsonScopeDirectory {
    path: PathBuf,
}

impl JsonScopeDirectory {
    /// Create a directory reading `<root>/scopes.json`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join("scopes.json"),
        }
    }
}

#[async_trait]
impl ScopeDirectory for JsonScopeDirectory {
    async fn list_scopes(&self) -> FeedResult<Vec<ScopeRecord>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FeedError::snapshot_read_with_source(format!("reading {}", self.path.display()), e)
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            FeedError::malformed_payload_with_source(
                format!("{} is not a scope roster", self.path.display()),
                e,
            )
        })
    }
}
