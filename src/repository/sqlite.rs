use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{cancellable, ensure_active, utc_day_bounds, MoodEntryRepository};
use crate::error::{AppError, AppResult};
use crate::models::mood_entry::to_db_timestamp;
use crate::models::{MoodEntry, MoodEntryRow};

const SELECT_ENTRY: &str = "SELECT Id, MoodKey, MoodName, Emoji, Sentiment, Emotion, Message, \
     TimestampUtc, CreatedAt, UpdatedAt, DeletedAt";

/// Every read is built from here so soft-deleted rows never reach a caller.
fn visible(select: &str) -> QueryBuilder<'static, Sqlite> {
    QueryBuilder::new(format!("{select} FROM MoodEntries WHERE DeletedAt IS NULL"))
}

/// Durable store over the `MoodEntries` table.
///
/// Inserts stamp `CreatedAt`/`UpdatedAt`; updates stamp `UpdatedAt` only.
#[derive(Debug, Clone)]
pub struct SqliteMoodEntryRepository {
    pool: SqlitePool,
}

impl SqliteMoodEntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Hide a visible entry from every query. Returns false when no visible
    /// row has that id.
    pub async fn soft_delete(&self, id: Uuid, cancel: &CancellationToken) -> AppResult<bool> {
        ensure_active(cancel)?;
        let now = to_db_timestamp(Utc::now());

        let mut tx = cancellable(cancel, async {
            Ok::<_, AppError>(self.pool.begin().await?)
        })
        .await?;
        let affected = cancellable(cancel, async {
            let result = sqlx::query(
                r#"
                UPDATE MoodEntries SET
                    DeletedAt = ?1,
                    UpdatedAt = ?1
                WHERE Id = ?2 AND DeletedAt IS NULL
                "#,
            )
            .bind(&now)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
            Ok::<_, AppError>(result.rows_affected())
        })
        .await?;
        commit_unless_cancelled(tx, cancel).await?;

        tracing::debug!(id = %id, affected, "Soft-deleted mood entry");
        Ok(affected > 0)
    }

    async fn fetch_entries(
        &self,
        mut query: QueryBuilder<'static, Sqlite>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>> {
        ensure_active(cancel)?;
        let rows = cancellable(cancel, async {
            let rows = query
                .build_query_as::<MoodEntryRow>()
                .fetch_all(&self.pool)
                .await?;
            Ok::<_, AppError>(rows)
        })
        .await?;
        rows.into_iter().map(MoodEntry::try_from).collect()
    }
}

/// Commit is the visibility point: a token that fired after the last
/// statement still rolls the transaction back.
async fn commit_unless_cancelled(
    tx: Transaction<'_, Sqlite>,
    cancel: &CancellationToken,
) -> AppResult<()> {
    if cancel.is_cancelled() {
        tx.rollback().await?;
        return Err(AppError::Cancelled);
    }
    tx.commit().await?;
    Ok(())
}

async fn insert_row(conn: &mut SqliteConnection, row: &MoodEntryRow) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO MoodEntries (
            Id, MoodKey, MoodName, Emoji, Sentiment, Emotion, Message,
            TimestampUtc, CreatedAt, UpdatedAt, DeletedAt
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
        "#,
    )
    .bind(&row.id)
    .bind(&row.mood_key)
    .bind(&row.mood_name)
    .bind(&row.emoji)
    .bind(&row.sentiment)
    .bind(&row.emotion)
    .bind(&row.message)
    .bind(to_db_timestamp(row.timestamp_utc))
    .bind(to_db_timestamp(row.created_at))
    .bind(to_db_timestamp(row.updated_at))
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl MoodEntryRepository for SqliteMoodEntryRepository {
    async fn add(&self, entry: MoodEntry, cancel: &CancellationToken) -> AppResult<()> {
        ensure_active(cancel)?;
        let row = MoodEntryRow::for_insert(entry, Utc::now());

        let mut tx = cancellable(cancel, async {
            Ok::<_, AppError>(self.pool.begin().await?)
        })
        .await?;
        cancellable(cancel, insert_row(&mut *tx, &row)).await?;
        commit_unless_cancelled(tx, cancel).await?;

        tracing::debug!(id = %row.id, "Inserted mood entry");
        Ok(())
    }

    async fn get_recent(
        &self,
        count: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>> {
        let limit = i64::try_from(count).unwrap_or(i64::MAX);
        let mut query = visible(SELECT_ENTRY);
        query
            .push(" ORDER BY TimestampUtc DESC LIMIT ")
            .push_bind(limit);
        self.fetch_entries(query, cancel).await
    }

    async fn count(&self, cancel: &CancellationToken) -> AppResult<usize> {
        ensure_active(cancel)?;
        let count = cancellable(cancel, async {
            let mut query = visible("SELECT COUNT(*)");
            let count = query
                .build_query_scalar::<i64>()
                .fetch_one(&self.pool)
                .await?;
            Ok::<_, AppError>(count)
        })
        .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn get_by_date(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>> {
        let (start, end) = utc_day_bounds(date);
        self.get_range(start, end, cancel).await
    }

    async fn get_range(
        &self,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>> {
        let mut query = visible(SELECT_ENTRY);
        query
            .push(" AND TimestampUtc >= ")
            .push_bind(to_db_timestamp(from_utc))
            .push(" AND TimestampUtc < ")
            .push_bind(to_db_timestamp(to_utc))
            .push(" ORDER BY TimestampUtc DESC");
        self.fetch_entries(query, cancel).await
    }
}
