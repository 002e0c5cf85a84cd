use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{CreateEntryRequest, Mood, MoodEntry, RangeQuery, RecentQuery, MOODS};
use crate::repository::DEFAULT_RECENT_COUNT;
use crate::AppState;

const MAX_RECENT_COUNT: usize = 500;

pub async fn create_entry(
    State(state): State<AppState>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<(StatusCode, Json<MoodEntry>)> {
    body.validate()?;

    let entry = body.into_entry(Utc::now());
    let cancel = state.shutdown.child_token();
    state.repo.add(entry.clone(), &cancel).await?;

    tracing::info!(id = %entry.id, mood = %entry.mood_key, "Mood entry logged");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let count = query.count.unwrap_or(DEFAULT_RECENT_COUNT);
    if count > MAX_RECENT_COUNT {
        return Err(AppError::Validation(format!(
            "count must be at most {MAX_RECENT_COUNT}"
        )));
    }

    let cancel = state.shutdown.child_token();
    let entries = state.repo.get_recent(count, &cancel).await?;
    Ok(Json(entries))
}

pub async fn count_entries(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let cancel = state.shutdown.child_token();
    let count = state.repo.count(&cancel).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn list_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("date must be formatted YYYY-MM-DD".into()))?;

    let cancel = state.shutdown.child_token();
    let entries = state.repo.get_by_date(date, &cancel).await?;
    Ok(Json(entries))
}

pub async fn list_range(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    if query.from > query.to {
        return Err(AppError::Validation("from must not be after to".into()));
    }

    let cancel = state.shutdown.child_token();
    let entries = state.repo.get_range(query.from, query.to, &cancel).await?;
    Ok(Json(entries))
}

pub async fn list_moods() -> Json<Vec<Mood>> {
    Json(MOODS.to_vec())
}
