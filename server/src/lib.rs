//! Word-association game backend.
//!
//! Callers are dealt a word and answer with a related one; the service
//! accumulates link traversals and per-word usage counters. Redis holds the
//! authoritative counters and the TTL'd per-IP sessions, Meilisearch a
//! searchable copy of the vocabulary that the random draw and the periodic
//! sync run against.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal, time::interval};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub mod chart;
pub mod config;
pub mod database;
pub mod error;
pub mod links;
pub mod reports;
pub mod routes;
pub mod search;
pub mod sessions;
pub mod state;
pub mod stats;
pub mod stores;
pub mod utils;
pub mod words;

use routes::{
    add_word_handler, answer_handler, find_word_handler, link_chart_handler, report_handler,
    skip_handler, word_chart_handler, word_handler,
};
use search::sync_words;
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    spawn_index_sync(state.clone());

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/word", get(word_handler))
        .route("/answer", post(answer_handler))
        .route("/skip", post(skip_handler))
        .route("/words", get(find_word_handler).post(add_word_handler))
        .route("/report", post(report_handler))
        .route("/chart/link", get(link_chart_handler))
        .route("/chart/word", get(word_chart_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();

    println!("Server shutting down...");
}

/// Periodic full refresh of the word index from Redis. The first tick fires
/// immediately, seeding the index at startup.
fn spawn_index_sync(state: Arc<State>) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(state.config.sync_interval_secs));
        loop {
            ticker.tick().await;
            match sync_words(state.words.as_ref(), state.index.as_ref()).await {
                Ok(count) => info!("word index sync: {count} documents"),
                Err(err) => warn!("word index sync failed: {err}"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
