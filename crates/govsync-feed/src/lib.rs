//! govsync Source Feed Boundary
//!
//! Traits and implementations for producing raw inventory records:
//!
//! - [`traits`] - [`SourceFeed`] and [`ScopeDirectory`] traits
//! - [`error`] - [`FeedError`] with transient/permanent classification
//! - [`memory`] - In-memory feed and directory (test doubles, local wiring)
//! - [`json`] - Feeds reading JSON snapshot directories
//!
//! The engine depends only on the traits; binaries pick concrete feeds.

pub mod error;
pub mod json;
pub mod memory;
pub mod traits;

pub use error::{FeedError, FeedResult};
pub use json::{JsonDirFeed, JsonScopeDirectory};
pub use memory::{StaticFeed, StaticScopeDirectory};
pub use traits::{ScopeDirectory, SourceFeed};
