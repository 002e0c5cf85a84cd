pub mod mood;
pub mod mood_entry;

pub use mood::{Mood, SentimentBucket, MOODS};
pub use mood_entry::{CreateEntryRequest, MoodEntry, MoodEntryRow, RangeQuery, RecentQuery};
