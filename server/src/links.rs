//! Directed word associations. A link is identified by its ordered
//! (start, end) pair; recording a traversal bumps the link total, today's
//! per-day count, and the two word counters, all as storage-side atomic
//! increments.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::stats::WordStats;
use crate::stores::{WordRecord, WordStore};
use crate::utils::today;
use crate::words::WordRegistry;

pub struct LinkTotals {
    pub count: u64,
    pub today: u64,
}

pub struct LinkTracker {
    store: Arc<dyn WordStore>,
    registry: Arc<WordRegistry>,
    stats: Arc<WordStats>,
}

impl LinkTracker {
    pub fn new(
        store: Arc<dyn WordStore>,
        registry: Arc<WordRegistry>,
        stats: Arc<WordStats>,
    ) -> Self {
        Self {
            store,
            registry,
            stats,
        }
    }

    /// Records one traversal of start→end. Both records must already be
    /// resolved; see [`LinkTracker::record_text`] for raw input.
    pub async fn record(
        &self,
        start: &WordRecord,
        end: &WordRecord,
    ) -> Result<LinkTotals, AppError> {
        let (count, today_count) = self
            .store
            .bump_link(&start.word, &end.word, today())
            .await?;
        self.stats.record_start(start).await?;
        self.stats.record_end(end).await?;
        Ok(LinkTotals {
            count,
            today: today_count,
        })
    }

    /// Resolves both words first, then records. Unknown or invalid words
    /// are not-found; nothing is created here.
    pub async fn record_text(
        &self,
        start: &str,
        end: &str,
        loose: bool,
    ) -> Result<LinkTotals, AppError> {
        let start = self.registry.find(start, loose).await?;
        let end = self.registry.find(end, loose).await?;
        self.record(&start, &end).await
    }

    pub async fn total(&self, start: &WordRecord, end: &WordRecord) -> Result<u64, AppError> {
        Ok(self.store.link_total(&start.word, &end.word).await?)
    }

    /// Per-day counts for the given days, oldest first; quiet days read 0.
    pub async fn history(
        &self,
        start: &WordRecord,
        end: &WordRecord,
        days: &[NaiveDate],
    ) -> Result<Vec<u64>, AppError> {
        Ok(self.store.link_series(&start.word, &end.word, days).await?)
    }
}
