//! Scope: the isolation boundary records belong to.
//!
//! A scope is either an ordinary boundary (a tenant environment,
//! workspace, project) identified by a [`ScopeId`], or the single
//! global aggregate under which tenant-wide metadata is filed. The
//! global aggregate is a first-class variant rather than a magic
//! identifier so call sites cannot forget to handle it.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

use crate::ids::{ParseIdError, ScopeId};

/// The all-zero UUID used as the wire representation of the global
/// aggregate scope.
pub const GLOBAL_SCOPE_SENTINEL: &str = "00000000-0000-0000-0000-000000000000";

/// An inventory isolation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Scope {
    /// A concrete boundary such as a tenant environment.
    Ordinary(ScopeId),
    /// The tenant-wide aggregate for records without a per-boundary home
    /// (capacity, licensing, governance policies).
    GlobalAggregate,
}

impl Scope {
    /// True for the global aggregate scope.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Scope::GlobalAggregate)
    }

    /// The UUID this scope is stored under. The global aggregate maps
    /// to the all-zero sentinel.
    #[must_use]
    pub fn storage_uuid(&self) -> Uuid {
        match self {
            Scope::Ordinary(id) => *id.as_uuid(),
            Scope::GlobalAggregate => Uuid::nil(),
        }
    }

    /// Builds a scope from a stored UUID, mapping the all-zero sentinel
    /// back to the global aggregate.
    #[must_use]
    pub fn from_storage_uuid(uuid: Uuid) -> Self {
        if uuid.is_nil() {
            Scope::GlobalAggregate
        } else {
            Scope::Ordinary(ScopeId::from_uuid(uuid))
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Ordinary(id) => write!(f, "{id}"),
            Scope::GlobalAggregate => write!(f, "{GLOBAL_SCOPE_SENTINEL}"),
        }
    }
}

impl FromStr for Scope {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s).map_err(|e| ParseIdError {
            id_type: "Scope",
            message: e.to_string(),
        })?;
        Ok(Scope::from_storage_uuid(uuid))
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

impl TryFrom<String> for Scope {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScopeId> for Scope {
    fn from(id: ScopeId) -> Self {
        Scope::Ordinary(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_displays_as_sentinel() {
        assert_eq!(Scope::GlobalAggregate.to_string(), GLOBAL_SCOPE_SENTINEL);
    }

    #[test]
    fn test_sentinel_parses_as_global() {
        let scope: Scope = GLOBAL_SCOPE_SENTINEL.parse().unwrap();
        assert!(scope.is_global());
    }

    #[test]
    fn test_ordinary_roundtrip() {
        let id = ScopeId::new();
        let scope = Scope::Ordinary(id);
        let parsed: Scope = scope.to_string().parse().unwrap();
        assert_eq!(parsed, scope);
        assert!(!parsed.is_global());
    }

    #[test]
    fn test_storage_uuid_mapping() {
        assert!(Scope::GlobalAggregate.storage_uuid().is_nil());
        assert_eq!(
            Scope::from_storage_uuid(Uuid::nil()),
            Scope::GlobalAggregate
        );

        let id = ScopeId::new();
        let round = Scope::from_storage_uuid(Scope::Ordinary(id).storage_uuid());
        assert_eq!(round, Scope::Ordinary(id));
    }

    #[test]
    fn test_invalid_string_rejected() {
        let result: Result<Scope, _> = "prod-environment".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&Scope::GlobalAggregate).unwrap();
        assert_eq!(json, format!("\"{GLOBAL_SCOPE_SENTINEL}\""));

        let back: Scope = serde_json::from_str(&json).unwrap();
        assert!(back.is_global());
    }
}
