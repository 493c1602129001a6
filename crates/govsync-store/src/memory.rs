//! In-memory record store.
//!
//! Backs tests and local runs. Keeps canonical records keyed by
//! (scope, key) and scope rows keyed by scope, with the same upsert and
//! scope-checked delete semantics the Postgres store has.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use govsync_core::{CanonicalRecord, RecordKey, Scope, ScopeRecord};

use crate::error::{StoreError, StoreResult};
use crate::RecordStore;

/// Thread-safe in-memory [`RecordStore`].
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<(Scope, RecordKey), CanonicalRecord>>,
    scopes: RwLock<HashMap<Scope, ScopeRecord>>,
    unavailable: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate total store outage: `check_ready` and every operation
    /// fail with an unavailability error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Simulate per-record write failures while reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn guard_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("store set to unavailable"))
        } else {
            Ok(())
        }
    }

    /// Fetch one record, for assertions.
    pub fn get(&self, scope: &Scope, key: RecordKey) -> Option<CanonicalRecord> {
        self.records
            .read()
            .ok()
            .and_then(|map| map.get(&(*scope, key)).cloned())
    }

    /// Total number of canonical records across all scopes.
    pub fn len(&self) -> usize {
        self.records.read().map(|map| map.len()).unwrap_or(0)
    }

    /// True when no canonical records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records stored for one scope, for assertions.
    pub fn records_for_scope(&self, scope: &Scope) -> Vec<CanonicalRecord> {
        self.records
            .read()
            .map(|map| {
                map.iter()
                    .filter(|((s, _), _)| s == scope)
                    .map(|(_, record)| record.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The stored scope row, for assertions.
    pub fn scope_row(&self, scope: &Scope) -> Option<ScopeRecord> {
        self.scopes
            .read()
            .ok()
            .and_then(|map| map.get(scope).cloned())
    }

    /// Number of stored scope rows.
    pub fn scope_row_count(&self) -> usize {
        self.scopes.read().map(|map| map.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn check_ready(&self) -> StoreResult<()> {
        self.guard_available()
    }

    async fn upsert(&self, record: &CanonicalRecord) -> StoreResult<()> {
        self.guard_available()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write(record.key, "writes set to fail"));
        }
        self.records
            .write()
            .map_err(|_| StoreError::query("records lock poisoned"))?
            .insert((record.scope, record.key), record.clone());
        Ok(())
    }

    async fn list_keys(&self, scope: &Scope) -> StoreResult<HashSet<RecordKey>> {
        self.guard_available()?;
        Ok(self
            .records
            .read()
            .map_err(|_| StoreError::query("records lock poisoned"))?
            .keys()
            .filter(|(s, _)| s == scope)
            .map(|(_, key)| *key)
            .collect())
    }

    async fn delete(&self, scope: &Scope, key: RecordKey) -> StoreResult<()> {
        self.guard_available()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::write(key, "writes set to fail"));
        }
        self.records
            .write()
            .map_err(|_| StoreError::query("records lock poisoned"))?
            .remove(&(*scope, key));
        Ok(())
    }

    async fn upsert_scope(&self, record: &ScopeRecord) -> StoreResult<()> {
        self.guard_available()?;
        self.scopes
            .write()
            .map_err(|_| StoreError::query("scopes lock poisoned"))?
            .insert(record.scope, record.clone());
        Ok(())
    }
}
