use serde::Serialize;

pub const SENTIMENT_POSITIVE: &str = "Positive";
pub const SENTIMENT_NEGATIVE: &str = "Negative";

/// One selectable mood from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mood {
    pub key: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub sentiment: &'static str,
}

pub const MOODS: [Mood; 5] = [
    Mood { key: "happy", name: "Happy", emoji: "😄", sentiment: SENTIMENT_POSITIVE },
    Mood { key: "sad", name: "Sad", emoji: "😢", sentiment: SENTIMENT_NEGATIVE },
    Mood { key: "excited", name: "Excited", emoji: "🤩", sentiment: SENTIMENT_POSITIVE },
    Mood { key: "tired", name: "Tired", emoji: "😴", sentiment: SENTIMENT_NEGATIVE },
    Mood { key: "calm", name: "Calm", emoji: "😌", sentiment: SENTIMENT_POSITIVE },
];

/// Coarse grouping of sentiment labels used to pick a support message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentBucket {
    Positive,
    Negative,
    Neutral,
}

impl SentimentBucket {
    /// Labels other than "Positive" and "Negative" fall into the neutral bucket.
    pub fn from_label(label: &str) -> Self {
        match label {
            SENTIMENT_POSITIVE => Self::Positive,
            SENTIMENT_NEGATIVE => Self::Negative,
            _ => Self::Neutral,
        }
    }

    pub fn messages(self) -> &'static [&'static str] {
        match self {
            Self::Positive => &POSITIVE_MESSAGES,
            Self::Negative => &NEGATIVE_MESSAGES,
            Self::Neutral => &NEUTRAL_MESSAGES,
        }
    }
}

const POSITIVE_MESSAGES: [&str; 5] = [
    "Love that energy. Keep it going!",
    "You're radiating great vibes today.",
    "Channel that mood into something awesome!",
    "Keep the momentum, you're doing great.",
    "That smile is your superpower today.",
];

const NEGATIVE_MESSAGES: [&str; 5] = [
    "It's okay to feel this way. Small steps count.",
    "Be gentle with yourself; you matter.",
    "Even tough moments pass. You're not alone.",
    "Rest is productive. Take what you need.",
    "Your feelings are valid; brighter moments are coming.",
];

const NEUTRAL_MESSAGES: [&str; 5] = [
    "Steady is a fine place to be.",
    "A calm moment can recharge everything.",
    "Use this space to reflect or plan something small.",
    "Neutral today leaves room for surprise later.",
    "A balanced mood sets a solid foundation.",
];

#[cfg(test)]
pub fn find_mood(key: &str) -> Option<&'static Mood> {
    MOODS.iter().find(|m| m.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keys_are_unique() {
        let mut keys: Vec<_> = MOODS.iter().map(|m| m.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), MOODS.len());
    }

    #[test]
    fn test_catalog_fits_column_bounds() {
        for mood in MOODS {
            assert!((1..=64).contains(&mood.key.chars().count()));
            assert!((1..=128).contains(&mood.name.chars().count()));
            assert!((1..=8).contains(&mood.emoji.chars().count()));
            assert!((1..=32).contains(&mood.sentiment.chars().count()));
        }
    }

    #[test]
    fn test_bucket_from_label() {
        assert_eq!(SentimentBucket::from_label("Positive"), SentimentBucket::Positive);
        assert_eq!(SentimentBucket::from_label("Negative"), SentimentBucket::Negative);
        assert_eq!(SentimentBucket::from_label("Mixed"), SentimentBucket::Neutral);
        assert_eq!(SentimentBucket::from_label("positive"), SentimentBucket::Neutral);
    }

    #[test]
    fn test_pools_are_disjoint_and_non_empty() {
        let buckets = [
            SentimentBucket::Positive,
            SentimentBucket::Negative,
            SentimentBucket::Neutral,
        ];
        for a in buckets {
            assert!(!a.messages().is_empty());
            for b in buckets.iter().filter(|b| **b != a) {
                assert!(a.messages().iter().all(|m| !b.messages().contains(m)));
            }
        }
    }

    #[test]
    fn test_find_mood() {
        assert_eq!(find_mood("calm").map(|m| m.emoji), Some("😌"));
        assert!(find_mood("angry").is_none());
    }
}
