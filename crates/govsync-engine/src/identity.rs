//! Identity resolution.
//!
//! Derives the stable primary key of a canonical record from its
//! (scope, kind, raw identifier) triple: SHA-256 over the composite
//! string, truncated to 128 bits and formatted as a UUID. The same
//! triple always yields the same key, and any differing component
//! yields a different key, so scope isolation and kind separation hold
//! at the key level before any guard runs.
//!
//! Records whose source carried no identifier get a freshly generated
//! random key instead. Such records cannot be re-matched on later
//! passes and therefore churn under purge; the [`ResolvedIdentity::
//! stable`] flag makes that visible rather than hiding it.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use govsync_core::{RecordKey, Scope, SourceKind};

/// The outcome of resolving a record's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// The derived (or, for identifier-less records, random) key.
    pub key: RecordKey,
    /// The original raw identifier, preserved for deep-linking.
    pub external_id: Option<String>,
    /// False when the key is random and cannot be re-derived.
    pub stable: bool,
}

/// Derive the deterministic key for a known raw identifier.
#[must_use]
pub fn resolve(scope: &Scope, kind: SourceKind, raw_identifier: &str) -> RecordKey {
    let composite = format!("{scope}_{kind}_{raw_identifier}");
    let digest = Sha256::digest(composite.as_bytes());

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    RecordKey::from_uuid(Uuid::from_bytes(bytes))
}

/// Resolve a record's identity, falling back to a random key when the
/// source carried no usable identifier.
#[must_use]
pub fn resolve_or_random(
    scope: &Scope,
    kind: SourceKind,
    raw_identifier: Option<&str>,
) -> ResolvedIdentity {
    match raw_identifier {
        Some(raw) if !raw.trim().is_empty() => ResolvedIdentity {
            key: resolve(scope, kind, raw),
            external_id: Some(raw.to_string()),
            stable: true,
        },
        _ => ResolvedIdentity {
            key: RecordKey::from_uuid(Uuid::new_v4()),
            external_id: None,
            stable: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govsync_core::ScopeId;

    #[test]
    fn test_resolution_is_deterministic() {
        let scope = Scope::Ordinary(ScopeId::new());
        let a = resolve(&scope, SourceKind::Application, "app-1");
        let b = resolve(&scope, SourceKind::Application, "app-1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_scopes_yield_distinct_keys() {
        let s1 = Scope::Ordinary(ScopeId::new());
        let s2 = Scope::Ordinary(ScopeId::new());
        assert_ne!(
            resolve(&s1, SourceKind::Workflow, "flow-123"),
            resolve(&s2, SourceKind::Workflow, "flow-123")
        );
    }

    #[test]
    fn test_distinct_kinds_yield_distinct_keys() {
        let scope = Scope::Ordinary(ScopeId::new());
        assert_ne!(
            resolve(&scope, SourceKind::Workflow, "flow-123"),
            resolve(&scope, SourceKind::Application, "flow-123")
        );
    }

    #[test]
    fn test_global_scope_participates_in_the_key() {
        let ordinary = Scope::Ordinary(ScopeId::new());
        assert_ne!(
            resolve(&Scope::GlobalAggregate, SourceKind::ScopeMetadata, "capacity"),
            resolve(&ordinary, SourceKind::ScopeMetadata, "capacity")
        );
    }

    #[test]
    fn test_missing_identifier_yields_unstable_identity() {
        let scope = Scope::Ordinary(ScopeId::new());

        let id = resolve_or_random(&scope, SourceKind::Site, None);
        assert!(!id.stable);
        assert!(id.external_id.is_none());

        let blank = resolve_or_random(&scope, SourceKind::Site, Some("  "));
        assert!(!blank.stable);

        // Two fallback resolutions never share a key.
        let other = resolve_or_random(&scope, SourceKind::Site, None);
        assert_ne!(id.key, other.key);
    }

    #[test]
    fn test_present_identifier_is_preserved_as_external_id() {
        let scope = Scope::Ordinary(ScopeId::new());
        let id = resolve_or_random(&scope, SourceKind::Package, Some("sol-9"));
        assert!(id.stable);
        assert_eq!(id.external_id.as_deref(), Some("sol-9"));
        assert_eq!(id.key, resolve(&scope, SourceKind::Package, "sol-9"));
    }
}
