//! Word validation, normalization and the registry.
//!
//! Words are stored under a normalized key (lowercase, spaces to
//! underscores); the display form keeps its capitalization with runs of
//! spaces and hyphens collapsed.

use std::borrow::Cow;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::search::DRAW_CAP;
use crate::stores::{WordIndex, WordRecord, WordStore};

static WORD_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ a-zA-Z-]{1,100}$").unwrap());
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// 1-100 characters, letters/spaces/hyphens only, at least one letter.
/// `loose` maps underscores back to spaces first so stored keys round-trip.
pub fn check_word(word: &str, loose: bool) -> bool {
    let candidate: Cow<str> = if loose {
        Cow::Owned(word.replace('_', " "))
    } else {
        Cow::Borrowed(word)
    };
    WORD_SHAPE.is_match(&candidate) && candidate.chars().any(|c| c.is_ascii_alphabetic())
}

pub fn normalize_display_word(word: &str) -> String {
    let collapsed = SPACE_RUNS.replace_all(word, " ");
    let collapsed = DASH_RUNS.replace_all(&collapsed, "-");
    collapsed.trim().to_string()
}

pub fn normalize_word(word: &str) -> String {
    word.replace(' ', "_").to_lowercase()
}

pub struct WordRegistry {
    store: Arc<dyn WordStore>,
    index: Arc<dyn WordIndex>,
}

impl WordRegistry {
    pub fn new(store: Arc<dyn WordStore>, index: Arc<dyn WordIndex>) -> Self {
        Self { store, index }
    }

    /// Adds a word, or returns the existing record when the normalized key
    /// is already taken. New words start disabled.
    pub async fn add(&self, raw: &str) -> Result<WordRecord, AppError> {
        if !check_word(raw, false) {
            return Err(AppError::InvalidWord);
        }
        let display_word = normalize_display_word(raw);
        let record = WordRecord {
            word: normalize_word(&display_word),
            display_word,
            enabled: false,
            starts: 0,
            ends: 0,
            skips: 0,
        };
        if let Some(existing) = self.store.fetch(&record.word).await? {
            return Ok(existing);
        }

        debug!("inserting new word: {}", record.word);
        let created = self.store.create(&record).await?;
        if !created {
            // Lost the create race; the stored row wins.
            if let Some(existing) = self.store.fetch(&record.word).await? {
                return Ok(existing);
            }
        }
        if let Err(err) = self.index.upsert_words(std::slice::from_ref(&record)).await {
            warn!("word index upsert failed, next sync heals it: {err}");
        }
        Ok(record)
    }

    pub async fn find(&self, raw: &str, loose: bool) -> Result<WordRecord, AppError> {
        if !check_word(raw, loose) {
            return Err(AppError::NotFound);
        }
        let key = normalize_word(&normalize_display_word(raw));
        self.store.fetch(&key).await?.ok_or(AppError::NotFound)
    }

    /// Uniform draw over the enabled words the index can count. The window
    /// tops out at [`DRAW_CAP`], so populations past the first thousand
    /// enabled documents are unreachable.
    pub async fn pick_random_enabled(&self) -> Result<WordRecord, AppError> {
        let window = self.index.enabled_count().await?.min(DRAW_CAP);
        if window == 0 {
            return Err(AppError::NoWordAvailable);
        }
        let offset = rand::thread_rng().gen_range(0..window);
        self.index
            .enabled_at(offset)
            .await?
            .ok_or(AppError::NoWordAvailable)
    }
}
