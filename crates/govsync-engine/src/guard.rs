//! Scope guard.
//!
//! Some upstream feeds are queried at a broader boundary than the scope
//! currently being reconciled and can return sibling-scope records.
//! Persisting those would corrupt the sibling's view, so every record
//! is checked against the scope its payload declares before it is
//! admitted.

use serde_json::Value;

use govsync_core::Scope;

/// Extract the scope a payload declares for itself, if any:
/// `properties.environment.name`, else the last path segment of
/// `properties.environment.id`.
#[must_use]
pub fn declared_scope(payload: &Value) -> Option<String> {
    let environment = payload.get("properties")?.get("environment")?;

    if let Some(name) = environment.get("name").and_then(Value::as_str) {
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }

    environment
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| id.rsplit('/').next())
        .filter(|segment| !segment.is_empty())
        .map(String::from)
}

/// Decide whether a record may be persisted under `target`.
///
/// The global aggregate admits everything; so does a payload with no
/// scope declaration. Otherwise the declared scope must match the
/// target, case-insensitively.
#[must_use]
pub fn admit(declared: Option<&str>, target: &Scope) -> bool {
    if target.is_global() {
        return true;
    }
    match declared {
        None => true,
        Some(declared) => declared.eq_ignore_ascii_case(&target.to_string()),
    }
}
