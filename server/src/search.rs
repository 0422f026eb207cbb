//! # Meilisearch
//!
//! Searchable copy of the vocabulary plus the append-only reports index.
//! Redis stays authoritative; documents here are refreshed on every word
//! creation and healed by the periodic full sync, so a failed index write is
//! never fatal to the request that caused it.
//!
//! ## Schema
//! - `words` index: word (**string**, primary key), display_word
//!   (**string**), enabled (**bool**, filterable), starts/ends/skips
//!   (**int**)
//! - `reports` index: id (**int**, primary key), ip, word, suggestion
//!
//! The random draw filters on `enabled = true` and fetches one document at a
//! uniform offset. The engine caps paginated hits at 1,000 by default, so
//! the draw window never reaches past the first thousand enabled documents.

use std::sync::Arc;

use async_trait::async_trait;
use meilisearch_sdk::{client::Client, settings::Settings};
use serde::Serialize;

use crate::stores::{ReportRecord, StoreError, WordIndex, WordRecord, WordStore};

pub const WORD_INDEX: &str = "words";
pub const REPORT_INDEX: &str = "reports";

pub const WORD_KEY: &str = "word";
pub const WORD_DISPLAY: &str = "display_word";
pub const WORD_ENABLED: &str = "enabled";
pub const WORD_STARTS: &str = "starts";

pub const REPORT_ID: &str = "id";

/// Draw window ceiling inherited from the engine's pagination default.
pub const DRAW_CAP: usize = 1000;

const ENABLED_FILTER: &str = "enabled = true";

pub async fn init_meilisearch(
    meili_url: &str,
    meili_admin_key: &str,
) -> Result<Arc<Client>, StoreError> {
    let meili_client = Arc::new(Client::new(meili_url, Some(meili_admin_key))?);

    meili_client
        .index(WORD_INDEX)
        .set_settings(&word_settings())
        .await?;

    Ok(meili_client)
}

fn word_settings() -> Settings {
    Settings::new()
        .with_filterable_attributes([WORD_ENABLED])
        .with_searchable_attributes([WORD_DISPLAY])
        .with_sortable_attributes([WORD_STARTS])
}

async fn upsert_items<T>(
    meili_client: &Client,
    index_name: &str,
    items: &[T],
    id_name: &str,
) -> Result<(), StoreError>
where
    T: Serialize + Send + Sync,
{
    meili_client
        .index(index_name)
        .add_or_update(items, Some(id_name))
        .await?
        .wait_for_completion(meili_client, None, None)
        .await?;
    Ok(())
}

/// Full refresh of the word documents from the authoritative store. Runs at
/// startup and on an interval; also how operator-side `enabled` flips reach
/// the draw.
pub async fn sync_words(
    store: &dyn WordStore,
    index: &dyn WordIndex,
) -> Result<usize, StoreError> {
    let words = store.all().await?;
    if !words.is_empty() {
        index.upsert_words(&words).await?;
    }
    Ok(words.len())
}

pub struct SearchWordIndex {
    client: Arc<Client>,
}

impl SearchWordIndex {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WordIndex for SearchWordIndex {
    async fn upsert_words(&self, docs: &[WordRecord]) -> Result<(), StoreError> {
        upsert_items(&self.client, WORD_INDEX, docs, WORD_KEY).await
    }

    async fn enabled_count(&self) -> Result<usize, StoreError> {
        let results = self
            .client
            .index(WORD_INDEX)
            .search()
            .with_filter(ENABLED_FILTER)
            .with_limit(1)
            .execute::<WordRecord>()
            .await?;
        Ok(results.estimated_total_hits.unwrap_or(0).min(DRAW_CAP))
    }

    async fn enabled_at(&self, offset: usize) -> Result<Option<WordRecord>, StoreError> {
        let results = self
            .client
            .index(WORD_INDEX)
            .search()
            .with_filter(ENABLED_FILTER)
            .with_limit(1)
            .with_offset(offset)
            .execute::<WordRecord>()
            .await?;
        Ok(results.hits.into_iter().next().map(|hit| hit.result))
    }

    async fn add_report(&self, report: &ReportRecord) -> Result<(), StoreError> {
        upsert_items(
            &self.client,
            REPORT_INDEX,
            std::slice::from_ref(report),
            REPORT_ID,
        )
        .await
    }
}
