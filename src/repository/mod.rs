//! Mood entry storage.
//!
//! [`MoodEntryRepository`] is the only way the rest of the service reads or
//! writes entries. Two backends implement it:
//!
//! - [`InMemoryMoodEntryRepository`]: bounded, insertion-ordered, lives for
//!   the process lifetime.
//! - [`SqliteMoodEntryRepository`]: durable `MoodEntries` table with audit
//!   stamps and soft delete.
//!
//! The backend is chosen once at startup by [`from_config`].

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, StoreBackend};
use crate::error::{AppError, AppResult};
use crate::models::MoodEntry;

mod memory;
mod sqlite;

pub use memory::InMemoryMoodEntryRepository;
pub use sqlite::SqliteMoodEntryRepository;

pub const DEFAULT_RECENT_COUNT: usize = 10;

/// Capability set every storage backend provides.
///
/// All reads return entries newest first by `timestamp_utc`. Every call
/// fails with [`AppError::Cancelled`] if `cancel` fires before it completes,
/// and a cancelled `add` leaves nothing behind.
#[async_trait]
pub trait MoodEntryRepository: Send + Sync {
    /// Store one entry. It is visible to every read that starts afterwards.
    async fn add(&self, entry: MoodEntry, cancel: &CancellationToken) -> AppResult<()>;

    /// At most `count` entries, newest first.
    async fn get_recent(
        &self,
        count: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>>;

    /// Number of visible entries.
    async fn count(&self, cancel: &CancellationToken) -> AppResult<usize>;

    /// Entries whose timestamp falls on `date`, with the day bounded in UTC.
    async fn get_by_date(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>>;

    /// Entries with `from_utc <= timestamp_utc < to_utc`.
    async fn get_range(
        &self,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>>;
}

/// Build the backend selected by `config`, running migrations for SQLite.
pub async fn from_config(config: &Config) -> anyhow::Result<Arc<dyn MoodEntryRepository>> {
    match config.store_backend {
        StoreBackend::InMemory => {
            tracing::info!(
                max_entries = config.max_in_memory_entries,
                "Using in-memory mood entry store"
            );
            Ok(Arc::new(InMemoryMoodEntryRepository::new(
                config.max_in_memory_entries,
            )))
        }
        StoreBackend::Sqlite => {
            let pool = crate::db::create_pool(
                &config.database_url,
                config.database_max_connections,
            )
            .await
            .with_context(|| format!("Failed to open database {}", config.database_url))?;

            crate::db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(SqliteMoodEntryRepository::new(pool)))
        }
    }
}

/// UTC half-open interval `[date 00:00Z, date+1 00:00Z)`.
pub fn utc_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(1))
}

pub(crate) fn ensure_active(cancel: &CancellationToken) -> AppResult<()> {
    if cancel.is_cancelled() {
        Err(AppError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run `fut` unless `cancel` fires first; an already-cancelled token wins.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = fut => result,
    }
}
