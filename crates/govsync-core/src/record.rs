//! Inventory record vocabulary.
//!
//! [`SourceRecord`] is what a feed hands over: a kind, the scope the
//! fetch targeted, an optional raw identifier and the untouched JSON
//! payload. [`CanonicalRecord`] is the normalized form the store
//! persists. [`ScopeRecord`] describes the scope itself and lives on a
//! separate store surface from canonical records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ids::RecordKey;
use crate::scope::Scope;

/// The category of inventory a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// End-user applications.
    Application,
    /// Automation workflows.
    Workflow,
    /// Published sites and portals.
    Site,
    /// Deployable packages (solutions).
    Package,
    /// Non-human identities (service principals, connections).
    Identity,
    /// Tenant-wide metadata feeds (capacity, licensing, governance
    /// policies); only valid under the global aggregate scope.
    ScopeMetadata,
}

impl SourceKind {
    /// All kinds, in feed-priority order.
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Application,
        SourceKind::Workflow,
        SourceKind::Site,
        SourceKind::Package,
        SourceKind::Identity,
        SourceKind::ScopeMetadata,
    ];

    /// Stable lowercase name, also used in storage and log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Application => "application",
            SourceKind::Workflow => "workflow",
            SourceKind::Site => "site",
            SourceKind::Package => "package",
            SourceKind::Identity => "identity",
            SourceKind::ScopeMetadata => "scope_metadata",
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application" => Ok(SourceKind::Application),
            "workflow" => Ok(SourceKind::Workflow),
            "site" => Ok(SourceKind::Site),
            "package" => Ok(SourceKind::Package),
            "identity" => Ok(SourceKind::Identity),
            "scope_metadata" => Ok(SourceKind::ScopeMetadata),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// Operational health derived from a record's reported state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Running or enabled, or nothing suggests otherwise.
    Healthy,
    /// Deliberately stopped, suspended or disabled.
    Disabled,
    /// Failed, errored or suspicious state.
    Issues,
}

impl HealthStatus {
    /// Stable lowercase name for storage and log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Disabled => "disabled",
            HealthStatus::Issues => "issues",
        }
    }
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw record as produced by a source feed, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// The kind of inventory the producing feed serves.
    pub kind: SourceKind,
    /// The scope the fetch targeted. The scope guard checks the
    /// payload's own declaration against this.
    pub origin_scope: Scope,
    /// Upstream identifier, if the payload carried one.
    pub raw_id: Option<String>,
    /// The payload exactly as the feed produced it.
    pub payload: Value,
}

impl SourceRecord {
    /// Convenience constructor for a record with a known identifier.
    #[must_use]
    pub fn new(kind: SourceKind, origin_scope: Scope, raw_id: impl Into<String>, payload: Value) -> Self {
        Self {
            kind,
            origin_scope,
            raw_id: Some(raw_id.into()),
            payload,
        }
    }
}

/// The normalized record the store persists, one row per identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// Deterministic key derived from (scope, kind, raw identifier).
    pub key: RecordKey,
    /// The scope the record belongs to.
    pub scope: Scope,
    /// Inventory category.
    pub kind: SourceKind,
    /// Human-readable name, never empty after normalization.
    pub display_name: String,
    /// Owner or author, empty string when unknown.
    pub owner: String,
    /// Raw lifecycle state string the health status was derived from.
    pub state: String,
    /// Derived operational health.
    pub health: HealthStatus,
    /// Whether the record is part of a managed package.
    pub is_managed: bool,
    /// Version string, if the payload carried one.
    pub version: Option<String>,
    /// Identifier of the containing package, if any.
    pub parent_container_id: Option<String>,
    /// Upstream creation timestamp, when parseable.
    pub created_at: Option<DateTime<Utc>>,
    /// Upstream last-modification timestamp, when parseable.
    pub modified_at: Option<DateTime<Utc>>,
    /// The original upstream identifier, preserved verbatim.
    pub external_id: Option<String>,
    /// Serialized source payload, kept only for rich records.
    pub raw_payload: Option<String>,
    /// False when the key had to be randomly generated because the
    /// source carried no identifier; such records cannot be re-matched
    /// across passes.
    pub identity_stable: bool,
}

/// A row describing a scope itself: display name, classification and
/// aggregated metadata. Scope records are refreshed out of band and are
/// never subject to canonical-record purge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRecord {
    /// The scope this row describes.
    pub scope: Scope,
    /// Human-readable scope name.
    pub display_name: String,
    /// Commercial class or SKU of the scope, if known.
    pub class: Option<String>,
    /// Deployment region, if known.
    pub region: Option<String>,
    /// Upstream provisioning state, if known.
    pub provisioning_state: Option<String>,
    /// Whether this is the tenant's default scope.
    pub is_default: bool,
    /// Aggregated raw metadata (for the global aggregate: the combined
    /// tenant-wide feed payloads plus a last-sync marker).
    pub metadata: Option<Value>,
}

impl ScopeRecord {
    /// The scope row representing the global aggregate.
    #[must_use]
    pub fn global_sentinel() -> Self {
        Self {
            scope: Scope::GlobalAggregate,
            display_name: "Global Tenant (System)".to_string(),
            class: Some("System".to_string()),
            region: None,
            provisioning_state: Some("Succeeded".to_string()),
            is_default: false,
            metadata: None,
        }
    }
}
