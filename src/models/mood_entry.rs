use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// One logged mood. Immutable once constructed; storage never rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub mood_key: String,
    pub mood_name: String,
    pub emoji: String,
    pub sentiment: String,
    pub emotion: Option<String>,
    pub message: Option<String>,
    pub timestamp_utc: DateTime<Utc>,
}

impl MoodEntry {
    /// Calendar day of `timestamp_utc`, taken at the UTC boundary.
    pub fn utc_date(&self) -> NaiveDate {
        self.timestamp_utc.date_naive()
    }
}

/// Storage shape of a `MoodEntries` row, including the audit columns.
#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "PascalCase")]
pub struct MoodEntryRow {
    pub id: String,
    pub mood_key: String,
    pub mood_name: String,
    pub emoji: String,
    pub sentiment: String,
    pub emotion: Option<String>,
    pub message: Option<String>,
    pub timestamp_utc: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MoodEntryRow {
    /// Row for a fresh insert: both audit stamps set to `now`, not deleted.
    pub fn for_insert(entry: MoodEntry, now: DateTime<Utc>) -> Self {
        Self {
            id: entry.id.to_string(),
            mood_key: entry.mood_key,
            mood_name: entry.mood_name,
            emoji: entry.emoji,
            sentiment: entry.sentiment,
            emotion: entry.emotion,
            message: entry.message,
            timestamp_utc: entry.timestamp_utc,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl TryFrom<MoodEntryRow> for MoodEntry {
    type Error = AppError;

    fn try_from(row: MoodEntryRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| anyhow::anyhow!("malformed entry id {:?}: {e}", row.id))?;
        Ok(Self {
            id,
            mood_key: row.mood_key,
            mood_name: row.mood_name,
            emoji: row.emoji,
            sentiment: row.sentiment,
            emotion: row.emotion,
            message: row.message,
            timestamp_utc: row.timestamp_utc,
        })
    }
}

/// Fixed-width text form used for every datetime column, so that string
/// comparison in SQL matches chronological order.
pub fn to_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// POST /api/entries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(length(min = 1, max = 64, message = "mood_key must be 1-64 characters"))]
    pub mood_key: String,

    #[validate(length(min = 1, max = 128, message = "mood_name must be 1-128 characters"))]
    pub mood_name: String,

    #[validate(length(min = 1, max = 8, message = "emoji must be 1-8 characters"))]
    pub emoji: String,

    #[validate(length(min = 1, max = 32, message = "sentiment must be 1-32 characters"))]
    pub sentiment: String,

    #[validate(length(max = 64, message = "emotion must be at most 64 characters"))]
    pub emotion: Option<String>,

    #[validate(length(max = 1024, message = "message must be at most 1024 characters"))]
    pub message: Option<String>,

    /// When the mood was felt. Default: now.
    pub timestamp_utc: Option<DateTime<Utc>>,
}

impl CreateEntryRequest {
    pub fn into_entry(self, now: DateTime<Utc>) -> MoodEntry {
        MoodEntry {
            id: Uuid::new_v4(),
            mood_key: self.mood_key,
            mood_name: self.mood_name,
            emoji: self.emoji,
            sentiment: self.sentiment,
            emotion: self.emotion,
            message: self.message,
            timestamp_utc: self.timestamp_utc.unwrap_or(now),
        }
    }
}

/// GET /api/entries/recent query params
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub count: Option<usize>,
}

/// GET /api/entries query params
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}
