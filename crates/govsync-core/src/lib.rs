//! govsync Core Library
//!
//! Shared vocabulary for the govsync inventory reconciliation platform.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers ([`ScopeId`], [`RecordKey`])
//! - [`scope`] - The [`Scope`] isolation boundary (ordinary vs global aggregate)
//! - [`record`] - Source, canonical and scope record types
//!
//! # Example
//!
//! ```
//! use govsync_core::{Scope, ScopeId, SourceKind};
//!
//! let scope = Scope::Ordinary(ScopeId::new());
//! assert!(!scope.is_global());
//! assert_eq!(SourceKind::Workflow.as_str(), "workflow");
//! ```

pub mod ids;
pub mod record;
pub mod scope;

pub use ids::{ParseIdError, RecordKey, ScopeId};
pub use record::{CanonicalRecord, HealthStatus, ScopeRecord, SourceKind, SourceRecord};
pub use scope::{Scope, GLOBAL_SCOPE_SENTINEL};
