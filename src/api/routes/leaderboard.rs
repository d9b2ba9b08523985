use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{require_region, ApiError};
use crate::models::LeaderboardEntry;
use crate::rank::RankError;
use crate::storage::{LeaderboardPage, TierFilter};

/// Page size when the query does not pass `limit`.
const DEFAULT_PAGE_LIMIT: usize = 50;
const MAX_PAGE_LIMIT: usize = 100;

/// Neighbors per side when the query does not pass `window`.
const DEFAULT_WINDOW: usize = 5;
const MAX_WINDOW: usize = 25;

// ── Page ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub region: Option<String>,
    pub tier: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

pub async fn page(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<LeaderboardPage>, ApiError> {
    let region = require_region(params.region.as_deref())?;
    let filter: TierFilter = params
        .tier
        .as_deref()
        .unwrap_or("all")
        .parse()
        .map_err(|e: RankError| ApiError::BadRequest(e.to_string()))?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    let page = state
        .store
        .page(region, filter, params.cursor.as_deref(), limit)?;

    Ok(Json(page))
}

// ── Surrounding ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SurroundingParams {
    pub region: Option<String>,
    pub player_id: Option<String>,
    pub window: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SurroundingResponse {
    pub player_id: String,
    pub entries: Vec<LeaderboardEntry>,
}

pub async fn surrounding(
    State(state): State<AppState>,
    Query(params): Query<SurroundingParams>,
) -> Result<Json<SurroundingResponse>, ApiError> {
    let region = require_region(params.region.as_deref())?;
    let player_id = params
        .player_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("player_id is required".to_string()))?;
    let window = params.window.unwrap_or(DEFAULT_WINDOW).clamp(1, MAX_WINDOW);

    let entries = state.store.surrounding(region, &player_id, window)?;

    Ok(Json(SurroundingResponse { player_id, entries }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::generator::MockGenerator;
    use crate::analysis::AnalysisCache;
    use crate::api::build_router;
    use crate::models::Region;
    use crate::rank::{Division, Tier};
    use crate::storage::{LeaderboardStore, StorageConfig};
    use crate::sync::riot::MockLadderSource;
    use crate::sync::{RefreshConfig, RefreshOrchestrator};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn setup_test_state(dir: &std::path::Path) -> AppState {
        let storage = StorageConfig::new(dir.to_path_buf());
        let store = LeaderboardStore::new(storage.clone());
        let orchestrator = RefreshOrchestrator::new(
            RefreshConfig::default(),
            Arc::new(MockLadderSource::new()),
            store.clone(),
        );

        AppState {
            storage: Arc::new(storage.clone()),
            store,
            orchestrator: Arc::new(orchestrator),
            cache: Arc::new(AnalysisCache::new(storage, "v1".to_string())),
            generator: Arc::new(MockGenerator::new("Keep farming.")),
        }
    }

    fn row(id: &str, tier: Tier, division: Division, lp: u32) -> LeaderboardEntry {
        LeaderboardEntry::new(id.to_string(), Region::Euw, tier, division, lp, 60, 40)
            .with_identity(format!("Player {}", id), "EUW".to_string())
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_page_orders_best_first() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        state
            .store
            .upsert(&row("bronze", Tier::Bronze, Division::Ii, 10))
            .unwrap();
        state
            .store
            .upsert(&row("gold", Tier::Gold, Division::Iv, 30))
            .unwrap();
        state
            .store
            .upsert(&row("diamond", Tier::Diamond, Division::I, 75))
            .unwrap();

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/leaderboard?region=EUW").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_players"], 3);
        assert_eq!(json["entries"][0]["player_id"], "diamond");
        assert_eq!(json["entries"][2]["player_id"], "bronze");
        assert!(json["next_cursor"].is_null());
    }

    #[tokio::test]
    async fn test_page_cursor_walks_the_ladder() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        for i in 0u32..5 {
            state
                .store
                .upsert(&row(&format!("p{}", i), Tier::Gold, Division::Iv, 90 - i * 10))
                .unwrap();
        }

        let app = build_router(state.clone());
        let (status, first) = get_json(app, "/api/leaderboard?region=EUW&limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["entries"].as_array().unwrap().len(), 2);
        assert_eq!(first["entries"][0]["player_id"], "p0");
        let cursor = first["next_cursor"].as_str().unwrap().to_string();

        let app = build_router(state);
        let (status, second) = get_json(
            app,
            &format!("/api/leaderboard?region=EUW&limit=2&cursor={}", cursor),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["entries"][0]["player_id"], "p2");
        assert_eq!(second["entries"][1]["player_id"], "p3");
        assert_eq!(second["total_players"], 5);
    }

    #[tokio::test]
    async fn test_page_tier_filter() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        state
            .store
            .upsert(&row("g1", Tier::Gold, Division::I, 40))
            .unwrap();
        state
            .store
            .upsert(&row("g2", Tier::Gold, Division::Iii, 80))
            .unwrap();
        state
            .store
            .upsert(&row("s1", Tier::Silver, Division::I, 99))
            .unwrap();

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/leaderboard?region=EUW&tier=gold").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_players"], 2);
        for entry in json["entries"].as_array().unwrap() {
            assert_eq!(entry["tier"], "GOLD");
        }
    }

    #[tokio::test]
    async fn test_page_empty_region_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/leaderboard?region=JP").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_players"], 0);
        assert_eq!(json["entries"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_page_rejects_bad_params() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());

        let cases = [
            "/api/leaderboard",
            "/api/leaderboard?region=ATLANTIS",
            "/api/leaderboard?region=EUW&tier=WOOD",
            "/api/leaderboard?region=EUW&cursor=not-a-cursor",
        ];

        for uri in cases {
            let app = build_router(state.clone());
            let (status, json) = get_json(app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
            assert_eq!(json["error"]["code"], "BAD_REQUEST", "uri: {}", uri);
        }
    }

    #[tokio::test]
    async fn test_page_limit_is_clamped() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        for i in 0u32..3 {
            state
                .store
                .upsert(&row(&format!("p{}", i), Tier::Gold, Division::Iv, 90 - i * 10))
                .unwrap();
        }

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/leaderboard?region=EUW&limit=0").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["entries"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_surrounding_window() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        for i in 0u32..7 {
            state
                .store
                .upsert(&row(&format!("p{}", i), Tier::Gold, Division::Iv, 95 - i * 10))
                .unwrap();
        }

        let app = build_router(state);
        let (status, json) = get_json(
            app,
            "/api/leaderboard/surrounding?region=EUW&player_id=p3&window=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["player_id"], "p3");
        let ids: Vec<&str> = json["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["player_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["p1", "p2", "p3", "p4", "p5"]);
    }

    #[tokio::test]
    async fn test_surrounding_missing_player_is_404() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        state
            .store
            .upsert(&row("p1", Tier::Gold, Division::Iv, 50))
            .unwrap();

        let app = build_router(state);
        let (status, json) = get_json(
            app,
            "/api/leaderboard/surrounding?region=EUW&player_id=ghost",
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_surrounding_requires_player_id() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/leaderboard/surrounding?region=EUW").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }
}
