//! User-submitted corrections. Append-only; nothing here is ever updated
//! or deleted.

use std::sync::Arc;

use crate::error::AppError;
use crate::stores::{ReportRecord, WordIndex, WordStore};

pub struct ReportIntake {
    store: Arc<dyn WordStore>,
    index: Arc<dyn WordIndex>,
}

impl ReportIntake {
    pub fn new(store: Arc<dyn WordStore>, index: Arc<dyn WordIndex>) -> Self {
        Self { store, index }
    }

    /// Callers validated the word upstream; this just records what was sent.
    pub async fn submit(
        &self,
        ip: &str,
        word: &str,
        suggestion: &str,
    ) -> Result<ReportRecord, AppError> {
        let report = ReportRecord {
            id: self.store.next_report_id().await?,
            ip: ip.to_string(),
            word: word.to_string(),
            suggestion: suggestion.to_string(),
        };
        self.index.add_report(&report).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::{MemoryWordIndex, MemoryWordStore};

    fn intake() -> (ReportIntake, Arc<MemoryWordIndex>) {
        let index = Arc::new(MemoryWordIndex::default());
        (
            ReportIntake::new(Arc::new(MemoryWordStore::default()), index.clone()),
            index,
        )
    }

    #[tokio::test]
    async fn submissions_append_with_increasing_ids() {
        let (intake, index) = intake();

        let first = intake
            .submit("10.0.0.1", "rust", "typo for trust")
            .await
            .unwrap();
        let second = intake
            .submit("10.0.0.2", "rust", "should be capitalized")
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let stored = index.reports.lock().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].suggestion, "typo for trust");
        assert_eq!(stored[1].ip, "10.0.0.2");
    }
}
