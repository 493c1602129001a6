//! The reconciliation engine.
//!
//! Drives the whole run: readiness probe, global aggregate pass, then
//! one pass per ordinary scope, bounded-concurrent. Each scope pass is
//! a sequential pipeline (fetch, normalize, upsert, purge) so upserts
//! and purge for one scope never race each other; isolation between
//! scopes is structural (key derivation, scope guard, scope-scoped
//! purge), which is what makes concurrent passes safe.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, trace, warn};

use govsync_core::{CanonicalRecord, RecordKey, ScopeRecord, SourceRecord};
use govsync_feed::{ScopeDirectory, SourceFeed};
use govsync_store::RecordStore;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::guard;
use crate::normalize::Normalizer;
use crate::report::{PassPhase, PassReport, RunReport};

/// Orchestrates reconciliation runs.
pub struct ReconciliationEngine {
    store: Arc<dyn RecordStore>,
    directory: Arc<dyn ScopeDirectory>,
    feeds: Vec<Arc<dyn SourceFeed>>,
    normalizer: Normalizer,
    config: EngineConfig,
    shutdown: Arc<AtomicBool>,
}

impl ReconciliationEngine {
    /// Create an engine with no feeds registered yet.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        directory: Arc<dyn ScopeDirectory>,
        config: EngineConfig,
    ) -> Self {
        let normalizer = Normalizer::new(config.rich_payload_min_bytes);
        Self {
            store,
            directory,
            feeds: Vec::new(),
            normalizer,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builder-style: register one source feed.
    #[must_use]
    pub fn with_feed(mut self, feed: Arc<dyn SourceFeed>) -> Self {
        self.feeds.push(feed);
        self
    }

    /// Builder-style: register several source feeds.
    #[must_use]
    pub fn with_feeds(mut self, feeds: impl IntoIterator<Item = Arc<dyn SourceFeed>>) -> Self {
        self.feeds.extend(feeds);
        self
    }

    /// Handle for requesting a cooperative stop. The engine checks it
    /// between scopes only; a pass that has started runs to completion,
    /// and purge in particular is never interrupted.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Execute one full reconciliation run.
    ///
    /// Fatal only when the store fails its readiness probe or the scope
    /// directory cannot be enumerated; everything else is absorbed into
    /// the returned [`RunReport`].
    pub async fn run(&self) -> EngineResult<RunReport> {
        let started = Instant::now();

        self.store
            .check_ready()
            .await
            .map_err(EngineError::StoreUnavailable)?;

        let mut report = RunReport::default();

        // Tenant-wide metadata reconciles under the global aggregate
        // before any ordinary scope runs.
        let global = run_scope_pass(
            Arc::clone(&self.store),
            self.feeds.clone(),
            self.normalizer.clone(),
            ScopeRecord::global_sentinel(),
        )
        .await;
        report.absorb(global);

        let scopes = self
            .directory
            .list_scopes()
            .await
            .map_err(EngineError::ScopeEnumeration)?;
        report.scopes_total = scopes.len() as u32;
        info!(scopes = scopes.len(), "scope roster enumerated");

        let limit = self.config.max_concurrent_scopes.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut handles = Vec::with_capacity(scopes.len());
        let mut skipped = 0u32;

        for scope_row in scopes {
            if self.shutdown.load(Ordering::SeqCst) {
                skipped += 1;
                continue;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                // The semaphore is never closed; bail out defensively
                // rather than panic.
                Err(_) => break,
            };

            // Re-check after possibly waiting on the permit.
            if self.shutdown.load(Ordering::SeqCst) {
                skipped += 1;
                continue;
            }

            let store = Arc::clone(&self.store);
            let feeds = self.feeds.clone();
            let normalizer = self.normalizer.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                run_scope_pass(store, feeds, normalizer, scope_row).await
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(pass) => report.absorb(pass),
                Err(e) => error!(error = %e, "scope pass task failed"),
            }
        }

        report.scopes_skipped = skipped;
        report.duration_seconds = started.elapsed().as_secs();

        info!(
            passes = report.passes_run,
            skipped = report.scopes_skipped,
            admitted = report.admitted(),
            upserted = report.upserted(),
            purged = report.purged(),
            failures = report.failures(),
            duration_seconds = report.duration_seconds,
            "reconciliation run finished"
        );

        Ok(report)
    }
}

/// One full pass over a single scope. Runs to completion regardless of
/// shutdown requests.
async fn run_scope_pass(
    store: Arc<dyn RecordStore>,
    feeds: Vec<Arc<dyn SourceFeed>>,
    normalizer: Normalizer,
    scope_row: ScopeRecord,
) -> PassReport {
    let scope = scope_row.scope;
    let mut report = PassReport::new(scope);
    info!(%scope, name = %scope_row.display_name, "starting scope pass");

    // Refresh the scope's own row first; it lives outside the
    // canonical-record purge universe.
    if let Err(e) = store.upsert_scope(&scope_row).await {
        warn!(%scope, error = %e, "scope row upsert failed");
    }

    // Fetching: each feed fails independently.
    let mut fetched: Vec<SourceRecord> = Vec::new();
    let mut global_payloads: Vec<(String, Vec<Value>)> = Vec::new();
    for feed in feeds.iter().filter(|feed| feed.serves(&scope)) {
        match feed.fetch(&scope).await {
            Ok(records) => {
                debug!(%scope, feed = feed.name(), count = records.len(), "feed fetched");
                if scope.is_global() {
                    global_payloads.push((
                        feed.name().to_string(),
                        records.iter().map(|r| r.payload.clone()).collect(),
                    ));
                }
                report.fetched += records.len() as u32;
                fetched.extend(records);
            }
            Err(e) => {
                warn!(
                    %scope,
                    feed = feed.name(),
                    code = e.error_code(),
                    transient = e.is_transient(),
                    error = %e,
                    "feed fetch failed, continuing without it"
                );
                report.feed_failures += 1;
            }
        }
    }

    // Normalizing: guard, then derive identity and canonical fields.
    report.phase = PassPhase::Normalizing;
    let mut admitted: Vec<CanonicalRecord> = Vec::with_capacity(fetched.len());
    let mut admitted_keys: HashSet<RecordKey> = HashSet::with_capacity(fetched.len());
    for record in &fetched {
        let declared = guard::declared_scope(&record.payload);
        if !guard::admit(declared.as_deref(), &scope) {
            trace!(
                %scope,
                declared = declared.as_deref().unwrap_or(""),
                kind = %record.kind,
                "record declares a foreign scope, skipping"
            );
            report.scope_mismatches += 1;
            continue;
        }

        let canonical = normalizer.normalize(record);
        if !canonical.identity_stable {
            report.unstable_identities += 1;
        }
        admitted_keys.insert(canonical.key);
        report.admitted += 1;
        admitted.push(canonical);
    }

    // The global pass folds every tenant-wide payload into the sentinel
    // row's metadata blob.
    if scope.is_global() {
        let mut blob = serde_json::Map::new();
        for (feed_name, payloads) in global_payloads {
            blob.insert(feed_name, Value::Array(payloads));
        }
        blob.insert(
            "lastSync".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let mut row = scope_row.clone();
        row.metadata = Some(Value::Object(blob));
        if let Err(e) = store.upsert_scope(&row).await {
            warn!(%scope, error = %e, "global metadata refresh failed");
        }
    }

    // Upserting: record-at-a-time, a failed write never aborts the
    // pass.
    report.phase = PassPhase::Upserting;
    for record in &admitted {
        match store.upsert(record).await {
            Ok(()) => report.upserted += 1,
            Err(e) => {
                warn!(%scope, key = %record.key, error = %e, "record upsert failed");
                report.upsert_failures += 1;
            }
        }
    }

    // Purging: everything stored for this scope that this pass did not
    // admit. The set is computed against admitted keys, not written
    // ones, so a record whose write just failed keeps its previous
    // version instead of being deleted.
    report.phase = PassPhase::Purging;
    match store.list_keys(&scope).await {
        Ok(existing) => {
            for key in existing.difference(&admitted_keys) {
                match store.delete(&scope, *key).await {
                    Ok(()) => report.purged += 1,
                    Err(e) => {
                        warn!(%scope, key = %key, error = %e, "purge delete failed");
                        report.purge_failures += 1;
                    }
                }
            }
            report.phase = PassPhase::Done;
        }
        Err(e) => {
            // Without the stored key set there is no purge set; leave
            // stale records for the next pass rather than guess.
            warn!(%scope, error = %e, "cannot compute purge set, purge skipped");
            report.error = Some(format!("purge skipped: {e}"));
        }
    }

    info!(
        %scope,
        phase = %report.phase,
        fetched = report.fetched,
        admitted = report.admitted,
        scope_mismatches = report.scope_mismatches,
        upserted = report.upserted,
        purged = report.purged,
        "scope pass finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use govsync_core::{Scope, ScopeId, SourceKind};
    use govsync_feed::{StaticFeed, StaticScopeDirectory};
    use govsync_store::InMemoryRecordStore;
    use serde_json::json;

    fn scope_row(scope: Scope, name: &str) -> ScopeRecord {
        ScopeRecord {
            scope,
            display_name: name.to_string(),
            class: None,
            region: None,
            provisioning_state: None,
            is_default: false,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_single_pass_reaches_done() {
        let store = Arc::new(InMemoryRecordStore::new());
        let scope = Scope::Ordinary(ScopeId::new());
        let feed = Arc::new(
            StaticFeed::new("apps", SourceKind::Application)
                .with_payloads(scope, vec![json!({"name": "app-1"})]),
        );

        let report = run_scope_pass(
            store.clone(),
            vec![feed],
            Normalizer::default(),
            scope_row(scope, "Dev"),
        )
        .await;

        assert!(report.is_clean());
        assert_eq!(report.fetched, 1);
        assert_eq!(report.admitted, 1);
        assert_eq!(report.upserted, 1);
        assert_eq!(report.purged, 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.scope_row(&scope).unwrap().display_name, "Dev");
    }

    #[tokio::test]
    async fn test_purge_skipped_when_listing_fails() {
        let store = Arc::new(InMemoryRecordStore::new());
        let scope = Scope::Ordinary(ScopeId::new());
        store.set_unavailable(true);

        let report = run_scope_pass(
            store.clone(),
            Vec::new(),
            Normalizer::default(),
            scope_row(scope, "Dev"),
        )
        .await;

        assert_eq!(report.phase, PassPhase::Purging);
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_run_fails_fast_when_store_unavailable() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.set_unavailable(true);
        let scope = Scope::Ordinary(ScopeId::new());
        let feed = Arc::new(StaticFeed::new("apps", SourceKind::Application));
        let directory = Arc::new(StaticScopeDirectory::new(vec![scope_row(scope, "Dev")]));

        let engine = ReconciliationEngine::new(store, directory, EngineConfig::default())
            .with_feed(feed.clone());

        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, EngineError::StoreUnavailable(_)));
        // Fatal before any fetch.
        assert_eq!(feed.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_run_fails_when_directory_unavailable() {
        let store = Arc::new(InMemoryRecordStore::new());
        let directory = Arc::new(StaticScopeDirectory::new(Vec::new()));
        directory.set_failing(true);

        let engine = ReconciliationEngine::new(store, directory, EngineConfig::default());
        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, EngineError::ScopeEnumeration(_)));
    }

    #[tokio::test]
    async fn test_shutdown_skips_remaining_scopes() {
        let store = Arc::new(InMemoryRecordStore::new());
        let rows: Vec<ScopeRecord> = (0..3)
            .map(|i| scope_row(Scope::Ordinary(ScopeId::new()), &format!("S{i}")))
            .collect();
        let directory = Arc::new(StaticScopeDirectory::new(rows));

        let engine = ReconciliationEngine::new(store.clone(), directory, EngineConfig::default());
        engine.shutdown_handle().store(true, Ordering::SeqCst);

        let report = engine.run().await.unwrap();
        assert_eq!(report.scopes_skipped, 3);
        // The global pass still ran and wrote the sentinel row.
        assert_eq!(report.passes_run, 1);
        assert_eq!(store.scope_row_count(), 1);
    }
}
