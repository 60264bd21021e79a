//! API routes for the score server.
//!
//! All paths are mounted under `/api` by the server router. Handlers own
//! request validation; the storage trait and the stats aggregator do the rest.

use crate::error::ApiError;
use crate::server::AppState;
use crate::stats::{self, StatsReport};
use crate::storage::{Difficulty, ScoreRecord, ScoreSubmission};
use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

type AppStateArc = Arc<AppState>;

/// Default leaderboard size when the client does not ask for one.
const DEFAULT_SCORE_LIMIT: u32 = 10;

// ============================================================================
// Score Routes
// ============================================================================

pub fn score_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/scores", get(list_scores).post(submit_score))
        .route("/scores/best", get(global_best))
        .route("/scores/player/:name", get(player_best))
}

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub limit: Option<u32>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoresResponse {
    pub scores: Vec<ScoreRecord>,
}

#[derive(Debug, Serialize)]
pub struct BestResponse {
    pub best: Option<ScoreRecord>,
}

async fn list_scores(
    State(state): State<AppStateArc>,
    Query(query): Query<ScoresQuery>,
) -> Result<Json<ScoresResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_SCORE_LIMIT);
    let scores = state.store.top_scores(limit, query.difficulty.as_deref())?;
    Ok(Json(ScoresResponse { scores }))
}

async fn global_best(State(state): State<AppStateArc>) -> Result<Json<BestResponse>, ApiError> {
    let best = state.store.global_best()?;
    Ok(Json(BestResponse { best }))
}

async fn player_best(
    State(state): State<AppStateArc>,
    Path(name): Path<String>,
) -> Result<Json<BestResponse>, ApiError> {
    let best = state.store.player_best(&name)?;
    Ok(Json(BestResponse { best }))
}

#[derive(Debug, Deserialize)]
pub struct SubmitScoreRequest {
    pub score: Option<i64>,
    pub wave: Option<i64>,
    pub accuracy: Option<f64>,
    pub difficulty: Option<String>,
    pub player_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitScoreResponse {
    pub id: i64,
    pub saved: bool,
    pub best: Option<ScoreRecord>,
}

async fn submit_score(
    State(state): State<AppStateArc>,
    payload: Result<Json<SubmitScoreRequest>, JsonRejection>,
) -> Result<Json<SubmitScoreResponse>, ApiError> {
    let Json(req) =
        payload.map_err(|e| ApiError::validation(format!("invalid request body: {e}")))?;

    let (Some(score), Some(wave)) = (req.score, req.wave) else {
        return Err(ApiError::validation("missing required fields: score, wave"));
    };
    if score < 0 || wave < 0 {
        return Err(ApiError::validation("score and wave must be non-negative"));
    }

    let submission = ScoreSubmission {
        player_name: req.player_name,
        score,
        wave,
        accuracy: req.accuracy,
        difficulty: req.difficulty.clone(),
    };
    let id = state.store.save_score(&submission)?;
    info!(
        "Score saved: id={} score={} wave={} difficulty={}",
        id,
        score,
        wave,
        req.difficulty.as_deref().unwrap_or("-")
    );

    // A score with both a recognized difficulty and an accuracy also feeds the
    // rolling stats window; the two writes are independent operations.
    if let (Some(difficulty), Some(accuracy)) = (req.difficulty.as_deref(), req.accuracy) {
        state.store.append_sample(difficulty, accuracy, score, wave)?;
        if let Some(tier) = Difficulty::parse(difficulty) {
            let snapshot = state.store.snapshot(tier)?;
            if let Some(report) = stats::aggregate(&snapshot) {
                info!("{}", stats::format_report(tier.as_str(), &report));
            }
        }
    }

    let best = state.store.global_best()?;
    Ok(Json(SubmitScoreResponse {
        id,
        saved: true,
        best,
    }))
}

// ============================================================================
// Stats Routes
// ============================================================================

pub fn stats_routes() -> Router<AppStateArc> {
    Router::new().route("/stats", get(get_stats))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Option<StatsReport>,
}

async fn get_stats(
    State(state): State<AppStateArc>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
    let raw = query
        .difficulty
        .ok_or_else(|| ApiError::validation("missing required parameter: difficulty"))?;
    let tier = Difficulty::parse(&raw)
        .ok_or_else(|| ApiError::validation(format!("unknown difficulty: {raw}")))?;

    let snapshot = state.store.snapshot(tier)?;
    Ok(Json(StatsResponse {
        stats: stats::aggregate(&snapshot),
    }))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Fallback for unmatched `/api/*` paths.
pub async fn api_not_found() -> ApiError {
    ApiError::NotFound
}
