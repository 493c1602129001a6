//! Record normalization.
//!
//! Maps a loosely-structured source payload into a [`CanonicalRecord`].
//! Different feeds and schema versions name the same concept
//! differently, so every attribute is resolved through an explicit
//! ordered chain of payload paths, tried in order. The chains are plain
//! data so precedence stays auditable.
//!
//! Normalization never fails: unknown or missing fields degrade to
//! defaults, and the only way a record is dropped is the scope guard,
//! which runs before normalization in the engine.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use govsync_core::{CanonicalRecord, SourceKind, SourceRecord};

use crate::health;
use crate::identity;

/// Display name chain, most specific first.
const DISPLAY_NAME_CHAIN: [&str; 8] = [
    "properties.displayName",
    "properties.displayname",
    "displayName",
    "displayname",
    "properties.name",
    "name",
    "properties.friendlyname",
    "properties.skuName",
];

/// Fallback when no chain entry produces a name.
const UNNAMED: &str = "Unnamed Asset";

/// Alternate fields tried when the resolved name looks like an opaque
/// identifier.
const READABLE_NAME_CHAIN: [&str; 2] = ["properties.name", "properties.displayname"];

/// Owner principal addresses outrank display names.
const OWNER_PRINCIPAL_CHAIN: [&str; 2] = ["properties.owner.email", "properties.creator.email"];

const OWNER_NAME_CHAIN: [&str; 4] = [
    "properties.owner.displayName",
    "properties.createdBy.displayName",
    "properties.publisherDisplayName",
    "properties.creator.userId",
];

const STATE_CHAIN: [&str; 3] = [
    "properties.state",
    "properties.status",
    "properties.provisioningState",
];

const CREATED_CHAIN: [&str; 4] = [
    "properties.createdTime",
    "properties.createdOn",
    "createdTime",
    "createdon",
];

const MODIFIED_CHAIN: [&str; 4] = [
    "properties.lastModifiedTime",
    "properties.modifiedTime",
    "properties.modifiedOn",
    "modifiedon",
];

const VERSION_CHAIN: [&str; 2] = ["properties.version", "properties.appVersion"];

const PARENT_CHAIN: [&str; 2] = ["properties.solutionId", "properties.packageId"];

/// Walk a dotted path into a JSON tree.
///
/// Some feeds emit flat payloads with no `properties` wrapper (the
/// tenant-wide capacity and licensing shapes in particular); for those,
/// the root doubles as the properties object, so a `properties.*` path
/// retries at the root when no `properties` object exists.
fn lookup<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let walk = |root: &'a Value, path: &str| {
        path.split('.').try_fold(root, |node, segment| node.get(segment))
    };

    if let Some(found) = walk(payload, path) {
        return Some(found);
    }
    if payload.get("properties").is_none() {
        if let Some(rest) = path.strip_prefix("properties.") {
            return walk(payload, rest);
        }
    }
    None
}

/// A non-empty string at the path, accepting bare strings and numbers.
fn string_at(payload: &Value, path: &str) -> Option<String> {
    match lookup(payload, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty string produced by a chain of paths.
fn first_string(payload: &Value, chain: &[&str]) -> Option<String> {
    chain.iter().find_map(|path| string_at(payload, path))
}

/// Like [`string_at`], but unwraps state objects shaped as
/// `{"name": ...}` or `{"id": ...}` that some feeds emit.
fn state_at(payload: &Value, path: &str) -> Option<String> {
    match lookup(payload, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("id"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from),
        _ => None,
    }
}

/// True when a resolved name reads as an opaque identifier rather than
/// a human-chosen title.
fn looks_opaque(name: &str) -> bool {
    name.len() > 30 && name.contains('-')
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Some feeds drop the zone suffix; treat those as UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp_from_chain(payload: &Value, chain: &[&str]) -> Option<DateTime<Utc>> {
    chain
        .iter()
        .find_map(|path| string_at(payload, path))
        .and_then(|raw| parse_timestamp(&raw))
}

/// Normalizer configuration and entry point.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Serialized payloads longer than this are retained verbatim.
    rich_payload_min_bytes: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            rich_payload_min_bytes: 500,
        }
    }
}

impl Normalizer {
    /// Create a normalizer with the given rich-payload threshold.
    #[must_use]
    pub fn new(rich_payload_min_bytes: usize) -> Self {
        Self {
            rich_payload_min_bytes,
        }
    }

    /// Normalize one source record into its canonical form.
    ///
    /// Identity is resolved here as well, so the output carries its
    /// final key; records without a raw identifier get a random key
    /// and are marked identity-unstable.
    #[must_use]
    pub fn normalize(&self, record: &SourceRecord) -> CanonicalRecord {
        let payload = &record.payload;
        let resolved =
            identity::resolve_or_random(&record.origin_scope, record.kind, record.raw_id.as_deref());

        let display_name = self.resolve_display_name(record.kind, payload);

        let owner = first_string(payload, &OWNER_PRINCIPAL_CHAIN)
            .or_else(|| first_string(payload, &OWNER_NAME_CHAIN))
            .unwrap_or_default();

        let state = STATE_CHAIN
            .iter()
            .find_map(|path| state_at(payload, path))
            .unwrap_or_else(|| "Active".to_string());
        let health = health::classify(&state);

        let is_managed = lookup(payload, "properties.isManaged")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| {
                string_at(payload, "properties.almMode").as_deref() == Some("Solution")
            });

        let raw_payload = self.rich_payload(record, resolved.external_id.as_deref());

        CanonicalRecord {
            key: resolved.key,
            scope: record.origin_scope,
            kind: record.kind,
            display_name,
            owner,
            state,
            health,
            is_managed,
            version: first_string(payload, &VERSION_CHAIN),
            parent_container_id: first_string(payload, &PARENT_CHAIN),
            created_at: timestamp_from_chain(payload, &CREATED_CHAIN),
            modified_at: timestamp_from_chain(payload, &MODIFIED_CHAIN),
            external_id: resolved.external_id,
            raw_payload,
            identity_stable: resolved.stable,
        }
    }

    fn resolve_display_name(&self, kind: SourceKind, payload: &Value) -> String {
        // Kind-specific preferences come before the generic chain.
        let preferred = match kind {
            SourceKind::Package => string_at(payload, "properties.friendlyname"),
            SourceKind::Site => string_at(payload, "properties.name"),
            _ => None,
        };

        let name = preferred
            .or_else(|| first_string(payload, &DISPLAY_NAME_CHAIN))
            .unwrap_or_else(|| UNNAMED.to_string());

        // A GUID-shaped result usually means the feed put the technical
        // name where the title belongs; look for a readable alternate.
        if looks_opaque(&name) {
            if let Some(alternate) = READABLE_NAME_CHAIN
                .iter()
                .find_map(|path| string_at(payload, path))
                .filter(|candidate| !looks_opaque(candidate))
            {
                return alternate;
            }
        }

        name
    }

    /// Decide whether the raw payload is worth keeping verbatim:
    /// oversized, a fully-qualified resource path, or tagged.
    fn rich_payload(&self, record: &SourceRecord, external_id: Option<&str>) -> Option<String> {
        let serialized = record.payload.to_string();

        let oversized = serialized.len() > self.rich_payload_min_bytes;
        let resource_path = external_id.is_some_and(|id| id.contains("/providers/"));
        let tagged = record.payload.get("tags").is_some()
            || lookup(&record.payload, "properties.tags").is_some();

        (oversized || resource_path || tagged).then_some(serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govsync_core::{HealthStatus, Scope, ScopeId};
    use serde_json::json;

    fn source(kind: SourceKind, raw_id: Option<&str>, payload: Value) -> SourceRecord {
        SourceRecord {
            kind,
            origin_scope: Scope::Ordinary(ScopeId::new()),
            raw_id: raw_id.map(String::from),
            payload,
        }
    }

    #[test]
    fn test_nested_display_name_outranks_root_name() {
        let record = source(
            SourceKind::Application,
            Some("app-1"),
            json!({"properties": {"displayName": "A"}, "name": "B"}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.display_name, "A");
    }

    #[test]
    fn test_nameless_payload_gets_placeholder() {
        let record = source(SourceKind::Application, Some("app-1"), json!({}));
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.display_name, "Unnamed Asset");
    }

    #[test]
    fn test_opaque_name_prefers_readable_alternate() {
        let record = source(
            SourceKind::Application,
            Some("app-1"),
            json!({
                "displayName": "3c5b2a80-91ab-4ffa-b7e1-0f2de1a9c8aa-generated",
                "properties": {"name": "Expense Tracker"}
            }),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.display_name, "Expense Tracker");
    }

    #[test]
    fn test_opaque_name_kept_when_no_alternate() {
        let opaque = "3c5b2a80-91ab-4ffa-b7e1-0f2de1a9c8aa-generated";
        let record = source(
            SourceKind::Application,
            Some("app-1"),
            json!({"displayName": opaque}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.display_name, opaque);
    }

    #[test]
    fn test_package_prefers_friendly_name() {
        let record = source(
            SourceKind::Package,
            Some("sol-1"),
            json!({"properties": {"displayName": "Technical", "friendlyname": "Friendly"}}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.display_name, "Friendly");
    }

    #[test]
    fn test_site_prefers_properties_name() {
        let record = source(
            SourceKind::Site,
            Some("site-1"),
            json!({"properties": {"displayName": "Portal Display", "name": "portal"}}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.display_name, "portal");
    }

    #[test]
    fn test_owner_email_outranks_display_name() {
        let record = source(
            SourceKind::Workflow,
            Some("flow-1"),
            json!({"properties": {
                "owner": {"email": "jo@example.org", "displayName": "Jo"},
                "createdBy": {"displayName": "Someone Else"}
            }}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.owner, "jo@example.org");
    }

    #[test]
    fn test_owner_falls_through_to_creator_user_id() {
        let record = source(
            SourceKind::Workflow,
            Some("flow-1"),
            json!({"properties": {"creator": {"userId": "u-77"}}}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.owner, "u-77");
    }

    #[test]
    fn test_state_defaults_to_active_and_unwraps_objects() {
        let bare = source(SourceKind::Application, Some("a"), json!({}));
        let canonical = Normalizer::default().normalize(&bare);
        assert_eq!(canonical.state, "Active");
        assert_eq!(canonical.health, HealthStatus::Healthy);

        let wrapped = source(
            SourceKind::Workflow,
            Some("f"),
            json!({"properties": {"state": {"id": "Stopped"}}}),
        );
        let canonical = Normalizer::default().normalize(&wrapped);
        assert_eq!(canonical.state, "Stopped");
        assert_eq!(canonical.health, HealthStatus::Disabled);
    }

    #[test]
    fn test_timestamps_parse_or_stay_unset() {
        let record = source(
            SourceKind::Application,
            Some("a"),
            json!({"properties": {
                "createdTime": "2023-04-01T12:30:00Z",
                "lastModifiedTime": "2023-04-02T08:00:00.123"
            }}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert!(canonical.created_at.is_some());
        assert!(canonical.modified_at.is_some());

        let garbled = source(
            SourceKind::Application,
            Some("a"),
            json!({"properties": {"createdTime": "yesterday"}}),
        );
        let canonical = Normalizer::default().normalize(&garbled);
        assert!(canonical.created_at.is_none());
        assert!(canonical.modified_at.is_none());
    }

    #[test]
    fn test_managed_flag_from_bool_or_alm_mode() {
        let explicit = source(
            SourceKind::Package,
            Some("s"),
            json!({"properties": {"isManaged": true}}),
        );
        assert!(Normalizer::default().normalize(&explicit).is_managed);

        let alm = source(
            SourceKind::Package,
            Some("s"),
            json!({"properties": {"almMode": "Solution"}}),
        );
        assert!(Normalizer::default().normalize(&alm).is_managed);

        let neither = source(SourceKind::Package, Some("s"), json!({}));
        assert!(!Normalizer::default().normalize(&neither).is_managed);
    }

    #[test]
    fn test_flat_payload_resolves_root_fields() {
        let record = source(
            SourceKind::ScopeMetadata,
            Some("licensing"),
            json!({"skuName": "Power Apps Per User", "status": "Suspended"}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.display_name, "Power Apps Per User");
        assert_eq!(canonical.state, "Suspended");
        assert_eq!(canonical.health, HealthStatus::Disabled);
    }

    #[test]
    fn test_flat_fallback_does_not_override_nested_fields() {
        // Once a properties object exists, root fields stay below it in
        // precedence.
        let record = source(
            SourceKind::Application,
            Some("a"),
            json!({"properties": {"status": "Running"}, "status": "Suspended"}),
        );
        let canonical = Normalizer::default().normalize(&record);
        assert_eq!(canonical.state, "Running");
        assert_eq!(canonical.health, HealthStatus::Healthy);
    }

    #[test]
    fn test_rich_payload_criteria() {
        let normalizer = Normalizer::new(500);

        let small = source(SourceKind::Application, Some("a"), json!({"x": 1}));
        assert!(normalizer.normalize(&small).raw_payload.is_none());

        let tagged = source(
            SourceKind::Application,
            Some("a"),
            json!({"x": 1, "tags": {"env": "prod"}}),
        );
        assert!(normalizer.normalize(&tagged).raw_payload.is_some());

        let pathy = source(
            SourceKind::Application,
            Some("/providers/Platform.Apps/apps/a"),
            json!({"x": 1}),
        );
        assert!(normalizer.normalize(&pathy).raw_payload.is_some());

        let big = source(
            SourceKind::Application,
            Some("a"),
            json!({"blob": "y".repeat(600)}),
        );
        assert!(normalizer.normalize(&big).raw_payload.is_some());
    }

    #[test]
    fn test_normalization_is_deterministic_for_stable_identities() {
        let record = source(
            SourceKind::Application,
            Some("app-1"),
            json!({"properties": {"displayName": "Twice"}}),
        );
        let normalizer = Normalizer::default();
        let a = normalizer.normalize(&record);
        let b = normalizer.normalize(&record);
        assert_eq!(a, b);
        assert!(a.identity_stable);
    }
}
