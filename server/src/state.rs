use std::sync::Arc;

use crate::config::Config;
use crate::database::{init_redis, RedisSessionStore, RedisWordStore};
use crate::links::LinkTracker;
use crate::reports::ReportIntake;
use crate::search::{init_meilisearch, SearchWordIndex};
use crate::sessions::SessionManager;
use crate::stats::WordStats;
use crate::stores::{SessionStore, WordIndex, WordStore};
use crate::words::WordRegistry;

pub struct State {
    pub config: Config,
    pub words: Arc<dyn WordStore>,
    pub index: Arc<dyn WordIndex>,
    pub registry: Arc<WordRegistry>,
    pub stats: Arc<WordStats>,
    pub links: LinkTracker,
    pub sessions: SessionManager,
    pub reports: ReportIntake,
}

impl State {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let redis_connection = init_redis(&config.redis_url)
            .await
            .expect("Redis misconfigured!");
        let meili_client = init_meilisearch(&config.meili_url, &config.meili_admin_key)
            .await
            .expect("Meilisearch misconfigured!");

        let words: Arc<dyn WordStore> = Arc::new(RedisWordStore::new(redis_connection.clone()));
        let session_store: Arc<dyn SessionStore> =
            Arc::new(RedisSessionStore::new(redis_connection));
        let index: Arc<dyn WordIndex> = Arc::new(SearchWordIndex::new(meili_client));

        let registry = Arc::new(WordRegistry::new(words.clone(), index.clone()));
        let stats = Arc::new(WordStats::new(words.clone()));
        let links = LinkTracker::new(words.clone(), registry.clone(), stats.clone());
        let sessions = SessionManager::new(session_store, registry.clone());
        let reports = ReportIntake::new(words.clone(), index.clone());

        Arc::new(Self {
            config,
            words,
            index,
            registry,
            stats,
            links,
            sessions,
            reports,
        })
    }
}
