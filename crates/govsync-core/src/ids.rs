//! Strongly Typed Identifiers
//!
//! Newtype wrappers around [`Uuid`] for the two identifier spaces in
//! govsync: scopes and canonical records. Keeping them as distinct
//! types prevents passing a record key where a scope is expected.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed ID type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Strongly typed identifier for an inventory scope (a tenant
    /// environment, workspace, or other isolation boundary).
    ///
    /// # Example
    ///
    /// ```
    /// use govsync_core::ScopeId;
    ///
    /// let id: ScopeId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
    /// assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    /// ```
    ScopeId
);

impl ScopeId {
    /// Creates a new random scope ID using UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

define_id!(
    /// Strongly typed key of a canonical inventory record.
    ///
    /// Record keys are derived deterministically from a record's scope,
    /// kind and raw identifier, so there is deliberately no random
    /// constructor here; derivation lives in the engine's identity
    /// resolver.
    RecordKey
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_scope_id_new_creates_valid_id() {
        let id = ScopeId::new();
        let id_str = id.to_string();
        // UUID format: 8-4-4-4-12 hex digits
        assert_eq!(id_str.len(), 36);
        assert!(id_str.contains('-'));
    }

    #[test]
    fn test_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = RecordKey::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn test_display_returns_uuid_string() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let id = ScopeId::from_uuid(uuid);
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_parse_invalid_uuid_returns_error() {
        let result: std::result::Result<ScopeId, _> = "not-a-uuid".parse();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "ScopeId");
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_error_display_names_the_type() {
        let result: std::result::Result<RecordKey, _> = "invalid".parse();
        let err = result.unwrap_err();
        let display = err.to_string();
        assert!(display.contains("RecordKey"));
        assert!(display.contains("Failed to parse"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let id = RecordKey::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = ScopeId::new();
        let json = serde_json::to_string(&original).unwrap();
        let deserialized: ScopeId = serde_json::from_str(&json).unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_can_use_record_key_as_hashmap_key() {
        let mut map: HashMap<RecordKey, String> = HashMap::new();
        let k1 = RecordKey::from_uuid(Uuid::new_v4());
        let k2 = RecordKey::from_uuid(Uuid::new_v4());

        map.insert(k1, "first".to_string());
        map.insert(k2, "second".to_string());

        assert_eq!(map.get(&k1), Some(&"first".to_string()));
        assert_eq!(map.get(&k2), Some(&"second".to_string()));
    }
}
