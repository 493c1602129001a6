//! Postgres record store.
//!
//! Canonical records live in `gov_record`, scope rows in `gov_scope`.
//! Upserts are `INSERT ... ON CONFLICT DO UPDATE` on the primary key,
//! and deletes predicate on both scope and key so purge can never cross
//! a scope boundary even with a colliding key.

use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use govsync_core::{
    CanonicalRecord, HealthStatus, RecordKey, Scope, ScopeRecord, SourceKind,
};

use crate::error::{StoreError, StoreResult};
use crate::RecordStore;

/// [`RecordStore`] backed by a Postgres connection pool.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing tables when they do not exist yet.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS gov_scope (
                scope_id UUID PRIMARY KEY,
                display_name TEXT NOT NULL,
                class TEXT,
                region TEXT,
                provisioning_state TEXT,
                is_default BOOLEAN NOT NULL DEFAULT FALSE,
                metadata JSONB,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query_with_source("creating gov_scope", e))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS gov_record (
                record_key UUID NOT NULL,
                scope_id UUID NOT NULL,
                kind TEXT NOT NULL,
                display_name TEXT NOT NULL,
                owner TEXT NOT NULL DEFAULT '',
                state TEXT NOT NULL,
                health TEXT NOT NULL,
                is_managed BOOLEAN NOT NULL DEFAULT FALSE,
                version TEXT,
                parent_container_id TEXT,
                created_at TIMESTAMPTZ,
                modified_at TIMESTAMPTZ,
                external_id TEXT,
                raw_payload TEXT,
                identity_stable BOOLEAN NOT NULL DEFAULT TRUE,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (scope_id, record_key)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query_with_source("creating gov_record", e))?;

        Ok(())
    }

    fn classify(context: &str, error: sqlx::Error) -> StoreError {
        match &error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::unavailable_with_source(context.to_string(), error)
            }
            _ => StoreError::query_with_source(context.to_string(), error),
        }
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> StoreResult<CanonicalRecord> {
    let kind_raw: String = row
        .try_get("kind")
        .map_err(|e| StoreError::query_with_source("reading kind", e))?;
    let kind = SourceKind::from_str(&kind_raw)
        .map_err(|e| StoreError::Serialization { message: e })?;

    let health_raw: String = row
        .try_get("health")
        .map_err(|e| StoreError::query_with_source("reading health", e))?;
    let health = match health_raw.as_str() {
        "healthy" => HealthStatus::Healthy,
        "disabled" => HealthStatus::Disabled,
        "issues" => HealthStatus::Issues,
        other => {
            return Err(StoreError::Serialization {
                message: format!("unknown health status: {other}"),
            })
        }
    };

    let key: Uuid = row
        .try_get("record_key")
        .map_err(|e| StoreError::query_with_source("reading record_key", e))?;
    let scope: Uuid = row
        .try_get("scope_id")
        .map_err(|e| StoreError::query_with_source("reading scope_id", e))?;

    let get_err = |e| StoreError::query_with_source("reading gov_record row", e);

    Ok(CanonicalRecord {
        key: RecordKey::from_uuid(key),
        scope: Scope::from_storage_uuid(scope),
        kind,
        display_name: row.try_get("display_name").map_err(get_err)?,
        owner: row.try_get("owner").map_err(get_err)?,
        state: row.try_get("state").map_err(get_err)?,
        health,
        is_managed: row.try_get("is_managed").map_err(get_err)?,
        version: row.try_get("version").map_err(get_err)?,
        parent_container_id: row.try_get("parent_container_id").map_err(get_err)?,
        created_at: row.try_get("created_at").map_err(get_err)?,
        modified_at: row.try_get("modified_at").map_err(get_err)?,
        external_id: row.try_get("external_id").map_err(get_err)?,
        raw_payload: row.try_get("raw_payload").map_err(get_err)?,
        identity_stable: row.try_get("identity_stable").map_err(get_err)?,
    })
}

impl PgRecordStore {
    /// Fetch one record, used by operational tooling and tests.
    pub async fn get(&self, scope: &Scope, key: RecordKey) -> StoreResult<Option<CanonicalRecord>> {
        let row = sqlx::query("SELECT * FROM gov_record WHERE scope_id = $1 AND record_key = $2")
            .bind(scope.storage_uuid())
            .bind(key.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::classify("fetching record", e))?;

        row.as_ref().map(row_to_record).transpose()
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn check_ready(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::unavailable_with_source("readiness probe failed", e))?;
        Ok(())
    }

    async fn upsert(&self, record: &CanonicalRecord) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO gov_record (
                record_key, scope_id, kind, display_name, owner, state,
                health, is_managed, version, parent_container_id,
                created_at, modified_at, external_id, raw_payload,
                identity_stable, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW())
            ON CONFLICT (scope_id, record_key) DO UPDATE SET
                kind = EXCLUDED.kind,
                display_name = EXCLUDED.display_name,
                owner = EXCLUDED.owner,
                state = EXCLUDED.state,
                health = EXCLUDED.health,
                is_managed = EXCLUDED.is_managed,
                version = EXCLUDED.version,
                parent_container_id = EXCLUDED.parent_container_id,
                created_at = EXCLUDED.created_at,
                modified_at = EXCLUDED.modified_at,
                external_id = EXCLUDED.external_id,
                raw_payload = EXCLUDED.raw_payload,
                identity_stable = EXCLUDED.identity_stable,
                updated_at = NOW()
            ",
        )
        .bind(record.key.as_uuid())
        .bind(record.scope.storage_uuid())
        .bind(record.kind.as_str())
        .bind(&record.display_name)
        .bind(&record.owner)
        .bind(&record.state)
        .bind(record.health.as_str())
        .bind(record.is_managed)
        .bind(&record.version)
        .bind(&record.parent_container_id)
        .bind(record.created_at)
        .bind(record.modified_at)
        .bind(&record.external_id)
        .bind(&record.raw_payload)
        .bind(record.identity_stable)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::unavailable_with_source("upserting record", e)
            }
            _ => StoreError::write_with_source(record.key, "upserting record", e),
        })?;
        Ok(())
    }

    async fn list_keys(&self, scope: &Scope) -> StoreResult<HashSet<RecordKey>> {
        let rows = sqlx::query("SELECT record_key FROM gov_record WHERE scope_id = $1")
            .bind(scope.storage_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::classify("listing record keys", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Uuid, _>("record_key")
                    .map(RecordKey::from_uuid)
                    .map_err(|e| StoreError::query_with_source("reading record_key", e))
            })
            .collect()
    }

    async fn delete(&self, scope: &Scope, key: RecordKey) -> StoreResult<()> {
        sqlx::query("DELETE FROM gov_record WHERE scope_id = $1 AND record_key = $2")
            .bind(scope.storage_uuid())
            .bind(key.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    StoreError::unavailable_with_source("deleting record", e)
                }
                _ => StoreError::write_with_source(key, "deleting record", e),
            })?;
        Ok(())
    }

    async fn upsert_scope(&self, record: &ScopeRecord) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO gov_scope (
                scope_id, display_name, class, region,
                provisioning_state, is_default, metadata, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (scope_id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                class = EXCLUDED.class,
                region = EXCLUDED.region,
                provisioning_state = EXCLUDED.provisioning_state,
                is_default = EXCLUDED.is_default,
                metadata = EXCLUDED.metadata,
                updated_at = NOW()
            ",
        )
        .bind(record.scope.storage_uuid())
        .bind(&record.display_name)
        .bind(&record.class)
        .bind(&record.region)
        .bind(&record.provisioning_state)
        .bind(record.is_default)
        .bind(&record.metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::classify("upserting scope row", e))?;
        Ok(())
    }
}
