use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{require_local, require_region, ApiError};
use crate::models::Region;
use crate::seed::seed_region;

/// Rows written when a seed request does not pass `players`.
const DEFAULT_SEED_PLAYERS: usize = 100;
const MAX_SEED_PLAYERS: usize = 10_000;

// ── Seed ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SeedParams {
    pub region: Option<String>,
    pub players: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub region: Region,
    pub players_written: usize,
    pub total_players: usize,
}

pub async fn seed(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(params): Json<SeedParams>,
) -> Result<Json<SeedResponse>, ApiError> {
    require_local(&headers)?;
    let region = require_region(params.region.as_deref())?;
    let players = params
        .players
        .unwrap_or(DEFAULT_SEED_PLAYERS)
        .clamp(1, MAX_SEED_PLAYERS);

    let players_written = seed_region(&state.store, region, players)?;
    let total_players = state.store.count(region)?;

    Ok(Json(SeedResponse {
        region,
        players_written,
        total_players,
    }))
}

// ── Reset ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResetParams {
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub region: Region,
    pub players_dropped: usize,
}

pub async fn reset(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(params): Json<ResetParams>,
) -> Result<Json<ResetResponse>, ApiError> {
    require_local(&headers)?;
    let region = require_region(params.region.as_deref())?;

    let players_dropped = state.store.reset(region)?;

    Ok(Json(ResetResponse {
        region,
        players_dropped,
    }))
}
