use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use super::{ensure_active, MoodEntryRepository};
use crate::config::DEFAULT_MAX_IN_MEMORY_ENTRIES;
use crate::error::AppResult;
use crate::models::MoodEntry;

/// Bounded, insertion-ordered store kept for the process lifetime.
///
/// Entries are keyed by a monotonically increasing sequence number, so the
/// map acts as an append-only queue: `tail` is the next slot to fill and
/// `head` is the oldest slot not yet evicted. Appends and reads never take
/// a store-wide lock; each read works on its own copy of the entries.
#[derive(Debug)]
pub struct InMemoryMoodEntryRepository {
    entries: DashMap<u64, MoodEntry>,
    head: AtomicU64,
    tail: AtomicU64,
    max_entries: usize,
}

impl InMemoryMoodEntryRepository {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
            max_entries,
        }
    }

    /// Copy of the entries in insertion order, oldest first.
    ///
    /// The map is walked shard by shard, so the copy is not atomic: a read
    /// overlapping concurrent adds may see a later slot without an earlier
    /// one. Adds that completed before the read started are always present.
    fn snapshot(&self) -> Vec<MoodEntry> {
        let mut slots: Vec<(u64, MoodEntry)> = self
            .entries
            .iter()
            .map(|slot| (*slot.key(), slot.value().clone()))
            .collect();
        slots.sort_unstable_by_key(|(seq, _)| *seq);
        slots.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Evict oldest slots until the store is back at capacity.
    ///
    /// Racing trimmers each claim a distinct head slot, and the size check is
    /// repeated after every eviction, so concurrent writers converge on the
    /// bound without coordinating.
    fn trim(&self) {
        while self.entries.len() > self.max_entries {
            let head = self.head.load(Ordering::SeqCst);
            if head >= self.tail.load(Ordering::SeqCst) {
                break;
            }
            if self
                .head
                .compare_exchange(head, head + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                self.entries.remove(&head);
            }
        }
    }

    fn sorted_newest_first(mut entries: Vec<MoodEntry>) -> Vec<MoodEntry> {
        entries.sort_by(|a, b| b.timestamp_utc.cmp(&a.timestamp_utc));
        entries
    }
}

impl Default for InMemoryMoodEntryRepository {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IN_MEMORY_ENTRIES)
    }
}

#[async_trait]
impl MoodEntryRepository for InMemoryMoodEntryRepository {
    async fn add(&self, entry: MoodEntry, cancel: &CancellationToken) -> AppResult<()> {
        ensure_active(cancel)?;
        let seq = self.tail.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(id = %entry.id, seq, "Appending mood entry");
        self.entries.insert(seq, entry);
        // A trimmer may have claimed this slot before the insert landed.
        if seq < self.head.load(Ordering::SeqCst) {
            self.entries.remove(&seq);
        }
        self.trim();
        Ok(())
    }

    async fn get_recent(
        &self,
        count: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>> {
        ensure_active(cancel)?;
        let snapshot = self.snapshot();
        let skip = snapshot.len().saturating_sub(count);
        // Pick by insertion recency, then order by timestamp; the stable sort
        // keeps later insertions first among equal timestamps.
        let latest = snapshot.into_iter().skip(skip).rev().collect();
        Ok(Self::sorted_newest_first(latest))
    }

    async fn count(&self, cancel: &CancellationToken) -> AppResult<usize> {
        ensure_active(cancel)?;
        Ok(self.entries.len())
    }

    async fn get_by_date(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>> {
        ensure_active(cancel)?;
        let matching = self
            .snapshot()
            .into_iter()
            .filter(|e| e.utc_date() == date)
            .collect();
        Ok(Self::sorted_newest_first(matching))
    }

    async fn get_range(
        &self,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<MoodEntry>> {
        ensure_active(cancel)?;
        let matching = self
            .snapshot()
            .into_iter()
            .filter(|e| e.timestamp_utc >= from_utc && e.timestamp_utc < to_utc)
            .collect();
        Ok(Self::sorted_newest_first(matching))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::contract_tests::{self, entry_at, utc};

    #[tokio::test]
    async fn test_by_date_matches_only_that_day() {
        contract_tests::by_date_matches_only_that_day(&InMemoryMoodEntryRepository::default()).await;
    }

    #[tokio::test]
    async fn test_by_date_uses_utc_midnight_edges() {
        contract_tests::by_date_uses_utc_midnight_edges(&InMemoryMoodEntryRepository::default())
            .await;
    }

    #[tokio::test]
    async fn test_range_is_half_open() {
        contract_tests::range_is_half_open(&InMemoryMoodEntryRepository::default()).await;
    }

    #[tokio::test]
    async fn test_range_respects_sub_microsecond_edges() {
        contract_tests::range_respects_sub_microsecond_edges(&InMemoryMoodEntryRepository::default())
            .await;
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_bounded() {
        contract_tests::recent_is_newest_first_and_bounded(&InMemoryMoodEntryRepository::default())
            .await;
    }

    #[tokio::test]
    async fn test_cancelled_calls_fail_without_side_effects() {
        contract_tests::cancelled_calls_fail_without_side_effects(
            &InMemoryMoodEntryRepository::default(),
        )
        .await;
    }

    #[tokio::test]
    async fn test_evicts_oldest_past_capacity() {
        let repo = InMemoryMoodEntryRepository::new(3);
        let cancel = CancellationToken::new();
        let mut added = Vec::new();
        for day in 1..=5 {
            let entry = entry_at(utc(2025, 1, day, 12, 0, 0));
            added.push(entry.id);
            repo.add(entry, &cancel).await.unwrap();
        }

        assert_eq!(repo.count(&cancel).await.unwrap(), 3);
        let recent: Vec<_> = repo
            .get_recent(3, &cancel)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(recent, vec![added[4], added[3], added[2]]);
    }

    #[tokio::test]
    async fn test_recent_selects_by_insertion_and_orders_by_timestamp() {
        let repo = InMemoryMoodEntryRepository::default();
        let cancel = CancellationToken::new();
        let later = entry_at(utc(2025, 1, 2, 12, 0, 0));
        let backdated = entry_at(utc(2024, 12, 1, 12, 0, 0));
        repo.add(later.clone(), &cancel).await.unwrap();
        repo.add(backdated.clone(), &cancel).await.unwrap();

        let recent = repo.get_recent(1, &cancel).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, backdated.id);

        let both: Vec<_> = repo
            .get_recent(2, &cancel)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(both, vec![later.id, backdated.id]);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_tolerated() {
        let repo = InMemoryMoodEntryRepository::default();
        let cancel = CancellationToken::new();
        let entry = entry_at(utc(2025, 1, 1, 12, 0, 0));
        repo.add(entry.clone(), &cancel).await.unwrap();
        repo.add(entry, &cancel).await.unwrap();
        assert_eq!(repo.count(&cancel).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_nothing() {
        let repo = InMemoryMoodEntryRepository::new(0);
        let cancel = CancellationToken::new();
        repo.add(entry_at(utc(2025, 1, 1, 12, 0, 0)), &cancel)
            .await
            .unwrap();
        assert_eq!(repo.count(&cancel).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_converge_to_capacity() {
        let repo = Arc::new(InMemoryMoodEntryRepository::new(50));
        let mut handles = Vec::new();
        for worker in 0..8u32 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let cancel = CancellationToken::new();
                for i in 0..100u32 {
                    let ts = utc(2025, 1, 1, 0, 0, 0)
                        + chrono::Duration::seconds(i64::from(worker * 1000 + i));
                    repo.add(entry_at(ts), &cancel).await.unwrap();
                    let _ = repo.get_recent(10, &cancel).await.unwrap();
                }
            }));
        }
        futures_util::future::join_all(handles)
            .await
            .into_iter()
            .for_each(|r| r.unwrap());

        let cancel = CancellationToken::new();
        let count = repo.count(&cancel).await.unwrap();
        assert!(count <= 50, "store holds {count} entries");
        assert!(count > 0);
    }
}
