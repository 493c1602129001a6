//! govsync Reconciliation Core
//!
//! Everything between the feed boundary and the store boundary:
//!
//! - [`identity`] - Deterministic record key derivation
//! - [`normalize`] - Ordered fallback-chain field normalization
//! - [`health`] - Coarse health classification
//! - [`guard`] - Cross-scope leakage protection
//! - [`engine`] - The per-scope pass state machine and run orchestration
//! - [`report`] - Pass and run counters
//! - [`config`] - Engine tunables
//! - [`error`] - Fatal run errors
//!
//! Repeated runs over unchanged sources are idempotent, and a run after
//! upstream changes converges the store to the new upstream state.

pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod health;
pub mod identity;
pub mod normalize;
pub mod report;

pub use config::EngineConfig;
pub use engine::ReconciliationEngine;
pub use error::{EngineError, EngineResult};
pub use identity::ResolvedIdentity;
pub use normalize::Normalizer;
pub use report::{PassPhase, PassReport, RunReport};
