//! govsyncd: runs one reconciliation pass over every scope.
//!
//! Wiring only: Postgres record store, JSON snapshot feeds, the
//! reconciliation engine, and a ctrl-c handler that requests a
//! cooperative stop. Scheduling (cron, timer trigger) stays outside
//! this binary; its contract is the exit code.

use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

use govsync_core::SourceKind;
use govsync_engine::ReconciliationEngine;
use govsync_feed::{JsonDirFeed, JsonScopeDirectory, SourceFeed};
use govsync_store::{PgRecordStore, RecordStore};

mod config;
mod logging;

use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.log_filter);

    let pool = match PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "failed to connect to the record store");
            return ExitCode::FAILURE;
        }
    };

    let store = PgRecordStore::new(pool);
    if let Err(e) = store.ensure_schema().await {
        error!(error = %e, "failed to prepare record store schema");
        return ExitCode::FAILURE;
    }
    let store: Arc<dyn RecordStore> = Arc::new(store);

    let directory = Arc::new(JsonScopeDirectory::new(&config.feed_dir));
    let feeds: Vec<Arc<dyn SourceFeed>> = SourceKind::ALL
        .into_iter()
        .map(|kind| {
            Arc::new(JsonDirFeed::new(kind.as_str(), kind, &config.feed_dir))
                as Arc<dyn SourceFeed>
        })
        .collect();

    let engine =
        ReconciliationEngine::new(store, directory, config.engine.clone()).with_feeds(feeds);

    let shutdown = engine.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown requested, finishing in-flight scope passes");
            shutdown.store(true, Ordering::SeqCst);
        }
    });

    info!(feed_dir = %config.feed_dir.display(), "starting reconciliation run");

    match engine.run().await {
        Ok(report) => {
            match serde_json::to_string(&report) {
                Ok(serialized) => info!(report = %serialized, "run report"),
                Err(e) => warn!(error = %e, "run report could not be serialized"),
            }
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                warn!(
                    failures = report.failures(),
                    skipped = report.scopes_skipped,
                    "run completed with degradations"
                );
                ExitCode::from(2)
            }
        }
        Err(e) => {
            error!(error = %e, "reconciliation run failed");
            ExitCode::FAILURE
        }
    }
}
