//! Periodic purge of history entries past the retention horizon.
//!
//! Deletes entries (and, through the foreign key cascade, their undo tokens)
//! older than the configured number of days, regardless of undo/redo state.
//! Runs on a fixed interval using `tokio::time::interval`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use history_db::repositories::HistoryEntryRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::HistoryConfig;

/// Purge everything created before `now - retention_days`.
pub async fn sweep_once(
    pool: &PgPool,
    retention_days: i64,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let cutoff = now - chrono::Duration::days(retention_days);
    HistoryEntryRepo::delete_older_than(pool, cutoff).await
}

/// Run the retention loop until `cancel` is triggered.
///
/// The first sweep happens immediately. Failures are logged and retried on
/// the next tick.
pub async fn run(pool: PgPool, config: HistoryConfig, cancel: CancellationToken) {
    let period = Duration::from_secs(config.sweep_interval_secs.max(1));

    tracing::info!(
        retention_days = config.retention_days,
        interval_secs = period.as_secs(),
        "History retention job started"
    );

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("History retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&pool, config.retention_days, Utc::now()).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "History retention: purged old entries");
                        } else {
                            tracing::debug!("History retention: no entries to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "History retention: purge failed");
                    }
                }
            }
        }
    }
}
