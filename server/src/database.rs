//! # Redis
//!
//! System of record. Counter mutations are storage-side atomic increments
//! (`INCR`/`HINCRBY`), paired lifetime+daily bumps run in one `MULTI` block,
//! so concurrent callers cannot lose updates. Session entries rely on native
//! key expiry; there is no secondary index to keep consistent.
//!
//! ## Key patterns
//!
//! ```text
//! word:{key}                            → hash {display, enabled, starts, ends, skips}
//! words                                 → set of all word keys
//! wordstat:{key}:{YYYY-MM-DD}           → hash {starts, ends, skips}
//! link:{start}:{end}                    → total traversal count
//! linkcount:{start}:{end}:{YYYY-MM-DD}  → per-day traversal count
//! req_{ip}                              → session entry JSON, EXPIRE 3600
//! report:next_id                        → report id allocator
//! ```
//!
//! Word keys only ever contain lowercase letters, underscores and hyphens,
//! so `:` is a safe separator.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::stores::{
    SESSION_TTL_SECS, SessionEntry, SessionStore, StoreError, WordCounter, WordRecord, WordStore,
};
use crate::utils::day_key;

const WORDS_SET: &str = "words";
const REPORT_SEQ: &str = "report:next_id";

const FIELD_DISPLAY: &str = "display";
const FIELD_ENABLED: &str = "enabled";

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    Ok(client.get_connection_manager_with_config(config).await?)
}

fn word_key(key: &str) -> String {
    format!("word:{key}")
}

fn stat_key(key: &str, day: NaiveDate) -> String {
    format!("wordstat:{key}:{}", day_key(day))
}

fn link_key(start: &str, end: &str) -> String {
    format!("link:{start}:{end}")
}

fn linkcount_key(start: &str, end: &str, day: NaiveDate) -> String {
    format!("linkcount:{start}:{end}:{}", day_key(day))
}

fn req_key(ip: &str) -> String {
    format!("req_{ip}")
}

fn field_u64(map: &HashMap<String, String>, field: &str) -> u64 {
    map.get(field).and_then(|v| v.parse().ok()).unwrap_or(0)
}

pub struct RedisWordStore {
    conn: ConnectionManager,
}

impl RedisWordStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl WordStore for RedisWordStore {
    async fn create(&self, record: &WordRecord) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let key = word_key(&record.word);
        // HSETNX on the display field is the existence gate; losing the race
        // leaves the earlier row untouched.
        let created: bool = conn
            .hset_nx(&key, FIELD_DISPLAY, &record.display_word)
            .await?;
        if created {
            let _: () = redis::pipe()
                .atomic()
                .hset(&key, FIELD_ENABLED, record.enabled as u8)
                .ignore()
                .hset(&key, WordCounter::Starts.field(), record.starts)
                .ignore()
                .hset(&key, WordCounter::Ends.field(), record.ends)
                .ignore()
                .hset(&key, WordCounter::Skips.field(), record.skips)
                .ignore()
                .sadd(WORDS_SET, &record.word)
                .ignore()
                .query_async(&mut conn)
                .await?;
        }
        Ok(created)
    }

    async fn fetch(&self, key: &str) -> Result<Option<WordRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let map: HashMap<String, String> = conn.hgetall(word_key(key)).await?;
        if map.is_empty() {
            return Ok(None);
        }
        Ok(Some(WordRecord {
            word: key.to_string(),
            display_word: map.get(FIELD_DISPLAY).cloned().unwrap_or_default(),
            enabled: map.get(FIELD_ENABLED).map(|v| v == "1").unwrap_or(false),
            starts: field_u64(&map, WordCounter::Starts.field()),
            ends: field_u64(&map, WordCounter::Ends.field()),
            skips: field_u64(&map, WordCounter::Skips.field()),
        }))
    }

    async fn all(&self) -> Result<Vec<WordRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.smembers(WORDS_SET).await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(record) = self.fetch(&key).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn bump_word(
        &self,
        key: &str,
        counter: WordCounter,
        day: NaiveDate,
    ) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let (total, _today): (u64, u64) = redis::pipe()
            .atomic()
            .hincr(word_key(key), counter.field(), 1)
            .hincr(stat_key(key, day), counter.field(), 1)
            .query_async(&mut conn)
            .await?;
        Ok(total)
    }

    async fn bump_link(
        &self,
        start: &str,
        end: &str,
        day: NaiveDate,
    ) -> Result<(u64, u64), StoreError> {
        let mut conn = self.conn.clone();
        let (total, today): (u64, u64) = redis::pipe()
            .atomic()
            .incr(link_key(start, end), 1)
            .incr(linkcount_key(start, end, day), 1)
            .query_async(&mut conn)
            .await?;
        Ok((total, today))
    }

    async fn link_total(&self, start: &str, end: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let total: Option<u64> = conn.get(link_key(start, end)).await?;
        Ok(total.unwrap_or(0))
    }

    async fn link_series(
        &self,
        start: &str,
        end: &str,
        days: &[NaiveDate],
    ) -> Result<Vec<u64>, StoreError> {
        if days.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for day in days {
            pipe.get(linkcount_key(start, end, *day));
        }
        let counts: Vec<Option<u64>> = pipe.query_async(&mut conn).await?;
        Ok(counts.into_iter().map(|c| c.unwrap_or(0)).collect())
    }

    async fn word_series(
        &self,
        key: &str,
        counter: WordCounter,
        days: &[NaiveDate],
    ) -> Result<Vec<u64>, StoreError> {
        if days.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for day in days {
            pipe.hget(stat_key(key, *day), counter.field());
        }
        let counts: Vec<Option<u64>> = pipe.query_async(&mut conn).await?;
        Ok(counts.into_iter().map(|c| c.unwrap_or(0)).collect())
    }

    async fn next_report_id(&self) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let id: u64 = conn.incr(REPORT_SEQ, 1).await?;
        Ok(id)
    }
}

pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, entry: &SessionEntry) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(entry)?;
        let _: () = conn
            .set_ex(req_key(&entry.ip), payload, SESSION_TTL_SECS)
            .await?;
        Ok(())
    }

    async fn get(&self, ip: &str) -> Result<Option<SessionEntry>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(req_key(ip)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, ip: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: u64 = conn.del(req_key(ip)).await?;
        Ok(())
    }
}
