use chrono::{Datelike, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{MoodEntry, SentimentBucket, MOODS};
use crate::repository::MoodEntryRepository;

/// Seeded entries sit at midday so they land on the intended day in any
/// nearby timezone.
const SEED_HOUR: u32 = 12;

/// Give an empty store one entry per past day of the current UTC month.
///
/// Failures are logged and swallowed; startup continues regardless.
pub async fn run_monthly_seed(repo: &dyn MoodEntryRepository, cancel: &CancellationToken) {
    let today = Utc::now().date_naive();
    let mut rng = StdRng::from_entropy();

    match seed_month(repo, today, &mut rng, cancel).await {
        Ok(0) => tracing::debug!(%today, "Monthly seed: nothing to seed"),
        Ok(count) => tracing::info!(count, %today, "Seeded mood entries for current month"),
        Err(e) => tracing::error!(error = %e, "Error seeding monthly mood data"),
    }
}

/// Seed days 1 through `today - 1` of `today`'s month if the store is empty.
/// Returns how many entries were added.
pub async fn seed_month<R: Rng + Send>(
    repo: &dyn MoodEntryRepository,
    today: NaiveDate,
    rng: &mut R,
    cancel: &CancellationToken,
) -> AppResult<usize> {
    if repo.count(cancel).await? > 0 {
        return Ok(0);
    }

    let first = today
        .with_day(1)
        .ok_or_else(|| anyhow::anyhow!("no first day for {today}"))?;
    let days = past_days_of_month(today);

    for offset in 0..days {
        let date = first + Duration::days(offset as i64);
        repo.add(synthesize_entry(date, rng)?, cancel).await?;
    }

    Ok(days)
}

/// Days strictly before `today` in its month: zero on the 1st.
pub fn past_days_of_month(today: NaiveDate) -> usize {
    today.day0() as usize
}

fn synthesize_entry<R: Rng>(date: NaiveDate, rng: &mut R) -> AppResult<MoodEntry> {
    let mood = MOODS
        .choose(rng)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("mood catalog is empty")))?;
    let message = SentimentBucket::from_label(mood.sentiment)
        .messages()
        .choose(rng)
        .map(|m| m.to_string());
    let timestamp = date
        .and_hms_opt(SEED_HOUR, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("no midday on {date}"))?
        .and_utc();

    Ok(MoodEntry {
        id: Uuid::new_v4(),
        mood_key: mood.key.into(),
        mood_name: mood.name.into(),
        emoji: mood.emoji.into(),
        sentiment: mood.sentiment.into(),
        emotion: None,
        message,
        timestamp_utc: timestamp,
    })
}
