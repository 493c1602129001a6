//! Pass and run reports.
//!
//! Counters accumulated while reconciling, serializable for log sinks
//! and operational tooling.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use govsync_core::Scope;

/// The state a scope pass is in, or finished in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPhase {
    Fetching,
    Normalizing,
    Upserting,
    Purging,
    Done,
}

impl Display for PassPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PassPhase::Fetching => "fetching",
            PassPhase::Normalizing => "normalizing",
            PassPhase::Upserting => "upserting",
            PassPhase::Purging => "purging",
            PassPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Counters for one scope pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    /// The scope this pass covered.
    pub scope: Scope,
    /// The phase the pass ended in; anything but `Done` means it was
    /// cut short.
    pub phase: PassPhase,
    /// Records fetched across all feeds.
    pub fetched: u32,
    /// Feeds that failed to fetch.
    pub feed_failures: u32,
    /// Records admitted past the scope guard.
    pub admitted: u32,
    /// Records rejected for declaring a foreign scope.
    pub scope_mismatches: u32,
    /// Admitted records whose identity had to be randomly generated.
    pub unstable_identities: u32,
    /// Successful upserts.
    pub upserted: u32,
    /// Failed upserts.
    pub upsert_failures: u32,
    /// Stale records deleted.
    pub purged: u32,
    /// Failed deletes.
    pub purge_failures: u32,
    /// Description of the failure that cut the pass short, if any.
    pub error: Option<String>,
}

impl PassReport {
    /// A fresh report for a pass about to start.
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            phase: PassPhase::Fetching,
            fetched: 0,
            feed_failures: 0,
            admitted: 0,
            scope_mismatches: 0,
            unstable_identities: 0,
            upserted: 0,
            upsert_failures: 0,
            purged: 0,
            purge_failures: 0,
            error: None,
        }
    }

    /// True when the pass reached `Done` without a recorded error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.phase == PassPhase::Done && self.error.is_none()
    }
}

/// Aggregated outcome of one engine run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Scopes the directory listed (the global aggregate not included).
    pub scopes_total: u32,
    /// Scope passes that ran (global pass included).
    pub passes_run: u32,
    /// Scopes skipped because shutdown was requested.
    pub scopes_skipped: u32,
    /// Per-pass reports, global pass first.
    pub passes: Vec<PassReport>,
    /// Run duration in seconds.
    pub duration_seconds: u64,
}

impl RunReport {
    /// Fold one finished pass into the run totals.
    pub fn absorb(&mut self, pass: PassReport) {
        self.passes_run += 1;
        self.passes.push(pass);
    }

    /// Sum of a counter across all passes.
    fn total(&self, pick: impl Fn(&PassReport) -> u32) -> u32 {
        self.passes.iter().map(pick).sum()
    }

    /// Total records admitted across all passes.
    #[must_use]
    pub fn admitted(&self) -> u32 {
        self.total(|p| p.admitted)
    }

    /// Total successful upserts across all passes.
    #[must_use]
    pub fn upserted(&self) -> u32 {
        self.total(|p| p.upserted)
    }

    /// Total stale records purged across all passes.
    #[must_use]
    pub fn purged(&self) -> u32 {
        self.total(|p| p.purged)
    }

    /// Total failures of any kind across all passes.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.total(|p| p.feed_failures + p.upsert_failures + p.purge_failures)
    }

    /// True when every pass finished cleanly and nothing was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.scopes_skipped == 0 && self.passes.iter().all(PassReport::is_clean)
    }
}
