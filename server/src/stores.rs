//! Store seams over the hosted backends.
//!
//! Redis holds the authoritative counters and the TTL'd session entries;
//! Meilisearch holds the searchable copy of the vocabulary and the
//! append-only reports. Handlers and components talk to these traits so the
//! wiring stays swappable and the behavior testable without live services.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session entries live this long once issued.
pub const SESSION_TTL_SECS: u64 = 3600;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("search error: {0}")]
    Search(#[from] meilisearch_sdk::errors::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A vocabulary entry. `word` is the normalized storage key, `display_word`
/// what callers originally typed (collapsed and trimmed). New words start
/// disabled; enabling them is an operator action outside this service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub word: String,
    pub display_word: String,
    pub enabled: bool,
    pub starts: u64,
    pub ends: u64,
    pub skips: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordCounter {
    Starts,
    Ends,
    Skips,
}

impl WordCounter {
    pub fn field(self) -> &'static str {
        match self {
            WordCounter::Starts => "starts",
            WordCounter::Ends => "ends",
            WordCounter::Skips => "skips",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "starts" => Some(WordCounter::Starts),
            "ends" => Some(WordCounter::Ends),
            "skips" => Some(WordCounter::Skips),
            _ => None,
        }
    }
}

/// Which word a requester was shown, and when.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub ip: String,
    pub word: String,
    pub display_word: String,
    pub added: DateTime<Utc>,
}

/// Immutable user-submitted correction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: u64,
    pub ip: String,
    pub word: String,
    pub suggestion: String,
}

/// Authoritative word, link and report-id storage. Every `bump_*` call is an
/// increment-or-create against (entity key, day), atomic on the storage side.
#[async_trait]
pub trait WordStore: Send + Sync {
    /// Returns `false` when the key already existed; the stored row wins.
    async fn create(&self, record: &WordRecord) -> Result<bool, StoreError>;

    async fn fetch(&self, key: &str) -> Result<Option<WordRecord>, StoreError>;

    async fn all(&self) -> Result<Vec<WordRecord>, StoreError>;

    /// Bumps the lifetime counter and today's snapshot together. Returns the
    /// new lifetime total.
    async fn bump_word(
        &self,
        key: &str,
        counter: WordCounter,
        day: NaiveDate,
    ) -> Result<u64, StoreError>;

    /// Bumps the link total and its per-day count together. Returns
    /// `(total, today)`.
    async fn bump_link(
        &self,
        start: &str,
        end: &str,
        day: NaiveDate,
    ) -> Result<(u64, u64), StoreError>;

    async fn link_total(&self, start: &str, end: &str) -> Result<u64, StoreError>;

    /// Per-day counts for the given days; absent days read as 0.
    async fn link_series(
        &self,
        start: &str,
        end: &str,
        days: &[NaiveDate],
    ) -> Result<Vec<u64>, StoreError>;

    async fn word_series(
        &self,
        key: &str,
        counter: WordCounter,
        days: &[NaiveDate],
    ) -> Result<Vec<u64>, StoreError>;

    async fn next_report_id(&self) -> Result<u64, StoreError>;
}

/// Session entries keyed by requester IP, expiring on their own.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, entry: &SessionEntry) -> Result<(), StoreError>;

    async fn get(&self, ip: &str) -> Result<Option<SessionEntry>, StoreError>;

    /// Removing a missing entry is not an error.
    async fn remove(&self, ip: &str) -> Result<(), StoreError>;
}

/// Searchable copy of the vocabulary plus the reports index.
#[async_trait]
pub trait WordIndex: Send + Sync {
    async fn upsert_words(&self, docs: &[WordRecord]) -> Result<(), StoreError>;

    /// Countable enabled documents. Implementations may cap this below the
    /// true population; callers size their random draw from it.
    async fn enabled_count(&self) -> Result<usize, StoreError>;

    async fn enabled_at(&self, offset: usize) -> Result<Option<WordRecord>, StoreError>;

    async fn add_report(&self, report: &ReportRecord) -> Result<(), StoreError>;
}

#[cfg(test)]
pub mod memory {
    //! In-memory stand-ins for the Redis and Meilisearch stores, with a
    //! manual clock for expiry and switchable read failures.

    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::Duration;

    use super::*;
    use crate::utils::day_key;

    #[derive(Default)]
    pub struct MemoryWordStore {
        words: Mutex<HashMap<String, WordRecord>>,
        word_days: Mutex<HashMap<String, u64>>,
        links: Mutex<HashMap<String, u64>>,
        link_days: Mutex<HashMap<String, u64>>,
        report_seq: AtomicU64,
    }

    #[async_trait]
    impl WordStore for MemoryWordStore {
        async fn create(&self, record: &WordRecord) -> Result<bool, StoreError> {
            let mut words = self.words.lock().unwrap();
            if words.contains_key(&record.word) {
                return Ok(false);
            }
            words.insert(record.word.clone(), record.clone());
            Ok(true)
        }

        async fn fetch(&self, key: &str) -> Result<Option<WordRecord>, StoreError> {
            Ok(self.words.lock().unwrap().get(key).cloned())
        }

        async fn all(&self) -> Result<Vec<WordRecord>, StoreError> {
            Ok(self.words.lock().unwrap().values().cloned().collect())
        }

        async fn bump_word(
            &self,
            key: &str,
            counter: WordCounter,
            day: NaiveDate,
        ) -> Result<u64, StoreError> {
            let total = {
                let mut words = self.words.lock().unwrap();
                let record = words.entry(key.to_string()).or_insert_with(|| WordRecord {
                    word: key.to_string(),
                    ..WordRecord::default()
                });
                match counter {
                    WordCounter::Starts => {
                        record.starts += 1;
                        record.starts
                    }
                    WordCounter::Ends => {
                        record.ends += 1;
                        record.ends
                    }
                    WordCounter::Skips => {
                        record.skips += 1;
                        record.skips
                    }
                }
            };
            let mut days = self.word_days.lock().unwrap();
            *days
                .entry(format!("{key}:{}:{}", day_key(day), counter.field()))
                .or_insert(0) += 1;
            Ok(total)
        }

        async fn bump_link(
            &self,
            start: &str,
            end: &str,
            day: NaiveDate,
        ) -> Result<(u64, u64), StoreError> {
            let total = {
                let mut links = self.links.lock().unwrap();
                let total = links.entry(format!("{start}:{end}")).or_insert(0);
                *total += 1;
                *total
            };
            let mut days = self.link_days.lock().unwrap();
            let today = days
                .entry(format!("{start}:{end}:{}", day_key(day)))
                .or_insert(0);
            *today += 1;
            Ok((total, *today))
        }

        async fn link_total(&self, start: &str, end: &str) -> Result<u64, StoreError> {
            Ok(self
                .links
                .lock()
                .unwrap()
                .get(&format!("{start}:{end}"))
                .copied()
                .unwrap_or(0))
        }

        async fn link_series(
            &self,
            start: &str,
            end: &str,
            days: &[NaiveDate],
        ) -> Result<Vec<u64>, StoreError> {
            let link_days = self.link_days.lock().unwrap();
            Ok(days
                .iter()
                .map(|day| {
                    link_days
                        .get(&format!("{start}:{end}:{}", day_key(*day)))
                        .copied()
                        .unwrap_or(0)
                })
                .collect())
        }

        async fn word_series(
            &self,
            key: &str,
            counter: WordCounter,
            days: &[NaiveDate],
        ) -> Result<Vec<u64>, StoreError> {
            let word_days = self.word_days.lock().unwrap();
            Ok(days
                .iter()
                .map(|day| {
                    word_days
                        .get(&format!("{key}:{}:{}", day_key(*day), counter.field()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect())
        }

        async fn next_report_id(&self) -> Result<u64, StoreError> {
            Ok(self.report_seq.fetch_add(1, Ordering::Relaxed) + 1)
        }
    }

    pub struct MemorySessionStore {
        entries: Mutex<HashMap<String, (SessionEntry, DateTime<Utc>)>>,
        clock: Mutex<DateTime<Utc>>,
        fail_reads: AtomicBool,
    }

    impl MemorySessionStore {
        pub fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                clock: Mutex::new(Utc::now()),
                fail_reads: AtomicBool::new(false),
            }
        }

        pub fn advance(&self, secs: i64) {
            let mut clock = self.clock.lock().unwrap();
            *clock = *clock + Duration::seconds(secs);
        }

        pub fn fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::Relaxed);
        }

        fn now(&self) -> DateTime<Utc> {
            *self.clock.lock().unwrap()
        }
    }

    #[async_trait]
    impl SessionStore for MemorySessionStore {
        async fn put(&self, entry: &SessionEntry) -> Result<(), StoreError> {
            let expires = self.now() + Duration::seconds(SESSION_TTL_SECS as i64);
            self.entries
                .lock()
                .unwrap()
                .insert(entry.ip.clone(), (entry.clone(), expires));
            Ok(())
        }

        async fn get(&self, ip: &str) -> Result<Option<SessionEntry>, StoreError> {
            if self.fail_reads.load(Ordering::Relaxed) {
                let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "cache offline");
                return Err(StoreError::Redis(redis::RedisError::from(io)));
            }
            let now = self.now();
            let mut entries = self.entries.lock().unwrap();
            match entries.get(ip) {
                Some((_, expires)) if *expires <= now => {
                    entries.remove(ip);
                    Ok(None)
                }
                Some((entry, _)) => Ok(Some(entry.clone())),
                None => Ok(None),
            }
        }

        async fn remove(&self, ip: &str) -> Result<(), StoreError> {
            self.entries.lock().unwrap().remove(ip);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MemoryWordIndex {
        docs: Mutex<BTreeMap<String, WordRecord>>,
        pub reports: Mutex<Vec<ReportRecord>>,
        pub max_offset: AtomicUsize,
    }

    #[async_trait]
    impl WordIndex for MemoryWordIndex {
        async fn upsert_words(&self, docs: &[WordRecord]) -> Result<(), StoreError> {
            let mut map = self.docs.lock().unwrap();
            for doc in docs {
                map.insert(doc.word.clone(), doc.clone());
            }
            Ok(())
        }

        async fn enabled_count(&self) -> Result<usize, StoreError> {
            Ok(self
                .docs
                .lock()
                .unwrap()
                .values()
                .filter(|doc| doc.enabled)
                .count())
        }

        async fn enabled_at(&self, offset: usize) -> Result<Option<WordRecord>, StoreError> {
            self.max_offset.fetch_max(offset, Ordering::Relaxed);
            Ok(self
                .docs
                .lock()
                .unwrap()
                .values()
                .filter(|doc| doc.enabled)
                .nth(offset)
                .cloned())
        }

        async fn add_report(&self, report: &ReportRecord) -> Result<(), StoreError> {
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }
}
