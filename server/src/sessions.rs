//! Which word was shown to which requester. Entries live in the cache under
//! a per-IP key with a fixed expiry; there is no secondary index, so nothing
//! can drift out of sync with it.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::error::AppError;
use crate::stores::{SessionEntry, SessionStore};
use crate::words::WordRegistry;

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    registry: Arc<WordRegistry>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, registry: Arc<WordRegistry>) -> Self {
        Self { store, registry }
    }

    /// Picks a random enabled word and stores it against the requester's IP.
    pub async fn issue(&self, ip: &str) -> Result<SessionEntry, AppError> {
        let word = self.registry.pick_random_enabled().await?;
        let entry = SessionEntry {
            ip: ip.to_string(),
            word: word.word,
            display_word: word.display_word,
            added: Utc::now(),
        };
        self.store.put(&entry).await?;
        Ok(entry)
    }

    /// The requester's live entry, if any. A cache read failure degrades to
    /// no-session rather than surfacing an error.
    pub async fn lookup(&self, ip: &str) -> Option<SessionEntry> {
        match self.store.get(ip).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!("session cache read failed for {ip}: {err}");
                None
            }
        }
    }

    pub async fn clear(&self, ip: &str) -> Result<(), AppError> {
        Ok(self.store.remove(ip).await?)
    }
}
