use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chart;
use crate::error::AppError;
use crate::state;
use crate::stores::{SessionEntry, WordCounter, WordRecord};
use crate::utils::trailing_days;

fn default_days() -> u32 {
    30
}

#[derive(Deserialize)]
pub struct WordPayload {
    pub word: String,
}

#[derive(Deserialize)]
pub struct ReportPayload {
    pub word: String,
    pub suggestion: String,
}

#[derive(Deserialize)]
pub struct FindParams {
    pub word: String,
    #[serde(default)]
    pub loose: bool,
}

#[derive(Deserialize)]
pub struct LinkChartParams {
    pub start: String,
    pub end: String,
    #[serde(default = "default_days")]
    pub days: u32,
}

#[derive(Deserialize)]
pub struct WordChartParams {
    pub word: String,
    pub counter: String,
    #[serde(default = "default_days")]
    pub days: u32,
}

#[derive(Serialize)]
pub struct AnswerReply {
    pub start: String,
    pub end: String,
    pub link_count: u64,
    pub today_count: u64,
    pub next: SessionEntry,
}

/// Returns the caller's live session, issuing a fresh word if none exists.
pub async fn word_handler(
    State(state): State<Arc<state::State>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Json<SessionEntry>, AppError> {
    let ip = addr.ip().to_string();
    if let Some(entry) = state.sessions.lookup(&ip).await {
        return Ok(Json(entry));
    }
    Ok(Json(state.sessions.issue(&ip).await?))
}

/// Links the shown word to the answer, then deals the caller a new word.
/// The answer is registered (disabled) if it has never been seen.
pub async fn answer_handler(
    State(state): State<Arc<state::State>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<WordPayload>,
) -> Result<Json<AnswerReply>, AppError> {
    let ip = addr.ip().to_string();
    let session = state.sessions.lookup(&ip).await.ok_or(AppError::NotFound)?;
    let shown = state.registry.find(&session.word, true).await?;
    let answer = state.registry.add(&payload.word).await?;
    let totals = state.links.record(&shown, &answer).await?;
    state.sessions.clear(&ip).await?;
    let next = state.sessions.issue(&ip).await?;
    Ok(Json(AnswerReply {
        start: shown.word,
        end: answer.word,
        link_count: totals.count,
        today_count: totals.today,
        next,
    }))
}

pub async fn skip_handler(
    State(state): State<Arc<state::State>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Json<SessionEntry>, AppError> {
    let ip = addr.ip().to_string();
    let session = state.sessions.lookup(&ip).await.ok_or(AppError::NotFound)?;
    let shown = state.registry.find(&session.word, true).await?;
    state.stats.record_skip(&shown).await?;
    state.sessions.clear(&ip).await?;
    Ok(Json(state.sessions.issue(&ip).await?))
}

pub async fn add_word_handler(
    State(state): State<Arc<state::State>>,
    Json(payload): Json<WordPayload>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.registry.add(&payload.word).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn find_word_handler(
    State(state): State<Arc<state::State>>,
    Query(params): Query<FindParams>,
) -> Result<Json<WordRecord>, AppError> {
    Ok(Json(state.registry.find(&params.word, params.loose).await?))
}

pub async fn report_handler(
    State(state): State<Arc<state::State>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<ReportPayload>,
) -> Result<impl IntoResponse, AppError> {
    let report = state
        .reports
        .submit(&addr.ip().to_string(), &payload.word, &payload.suggestion)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn link_chart_handler(
    State(state): State<Arc<state::State>>,
    Query(params): Query<LinkChartParams>,
) -> Result<String, AppError> {
    let start = state.registry.find(&params.start, true).await?;
    let end = state.registry.find(&params.end, true).await?;
    let days = trailing_days(params.days.min(365));
    let series = state.links.history(&start, &end, &days).await?;
    Ok(chart::build(&series, (days[0], days[days.len() - 1])))
}

pub async fn word_chart_handler(
    State(state): State<Arc<state::State>>,
    Query(params): Query<WordChartParams>,
) -> Result<String, AppError> {
    let counter =
        WordCounter::from_name(&params.counter).ok_or(AppError::MalformedPayload)?;
    let word = state.registry.find(&params.word, true).await?;
    let days = trailing_days(params.days.min(365));
    let series = state.stats.history(&word, counter, &days).await?;
    Ok(chart::build(&series, (days[0], days[days.len() - 1])))
}
