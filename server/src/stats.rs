//! Per-word usage counters: lifetime totals on the word itself plus a
//! per-day snapshot, both bumped in one atomic storage operation.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::stores::{WordCounter, WordRecord, WordStore};
use crate::utils::today;

pub struct WordStats {
    store: Arc<dyn WordStore>,
}

impl WordStats {
    pub fn new(store: Arc<dyn WordStore>) -> Self {
        Self { store }
    }

    /// The word was shown as the start of an association.
    pub async fn record_start(&self, word: &WordRecord) -> Result<u64, AppError> {
        Ok(self
            .store
            .bump_word(&word.word, WordCounter::Starts, today())
            .await?)
    }

    /// The word arrived as an answer.
    pub async fn record_end(&self, word: &WordRecord) -> Result<u64, AppError> {
        Ok(self
            .store
            .bump_word(&word.word, WordCounter::Ends, today())
            .await?)
    }

    /// The requester skipped the word.
    pub async fn record_skip(&self, word: &WordRecord) -> Result<u64, AppError> {
        Ok(self
            .store
            .bump_word(&word.word, WordCounter::Skips, today())
            .await?)
    }

    /// Per-day counts for the given days, oldest first; quiet days read 0.
    pub async fn history(
        &self,
        word: &WordRecord,
        counter: WordCounter,
        days: &[NaiveDate],
    ) -> Result<Vec<u64>, AppError> {
        Ok(self.store.word_series(&word.word, counter, days).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::MemoryWordStore;
    use crate::utils::trailing_days;

    fn stats() -> (WordStats, Arc<MemoryWordStore>) {
        let store = Arc::new(MemoryWordStore::default());
        (WordStats::new(store.clone()), store)
    }

    fn word(key: &str) -> WordRecord {
        WordRecord {
            word: key.to_string(),
            display_word: key.to_string(),
            ..WordRecord::default()
        }
    }

    #[tokio::test]
    async fn skip_bumps_lifetime_and_daily_counts() {
        let (stats, store) = stats();
        let rust = word("rust");
        store.create(&rust).await.unwrap();

        assert_eq!(stats.record_skip(&rust).await.unwrap(), 1);
        assert_eq!(stats.record_skip(&rust).await.unwrap(), 2);

        let stored = store.fetch("rust").await.unwrap().unwrap();
        assert_eq!(stored.skips, 2);
        assert_eq!(stored.starts, 0);

        let series = stats
            .history(&rust, WordCounter::Skips, &trailing_days(3))
            .await
            .unwrap();
        assert_eq!(series, vec![0, 0, 2]);
    }

    #[tokio::test]
    async fn counters_stay_independent() {
        let (stats, store) = stats();
        let rust = word("rust");
        store.create(&rust).await.unwrap();

        stats.record_start(&rust).await.unwrap();
        stats.record_end(&rust).await.unwrap();
        stats.record_end(&rust).await.unwrap();

        let stored = store.fetch("rust").await.unwrap().unwrap();
        assert_eq!(stored.starts, 1);
        assert_eq!(stored.ends, 2);
        assert_eq!(stored.skips, 0);
    }
}
