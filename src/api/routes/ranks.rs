use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::MatchRankAnnotation;
use crate::rank;
use crate::storage::JsonlWriter;

#[derive(Debug, Deserialize)]
pub struct AverageParams {
    /// One label per participant; `null` marks an unranked player.
    pub ranks: Vec<Option<String>>,
    /// When present, the result is recorded against this match.
    pub match_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AverageResponse {
    pub average: String,
    pub sample_size: usize,
}

pub async fn average(
    State(state): State<AppState>,
    Json(params): Json<AverageParams>,
) -> Result<Json<AverageResponse>, ApiError> {
    let average = rank::average_rank(&params.ranks);
    let sample_size = params
        .ranks
        .iter()
        .flatten()
        .filter(|label| rank::parse_label(label).is_ok())
        .count();

    if let Some(match_id) = params.match_id.filter(|id| !id.is_empty()) {
        let annotation = MatchRankAnnotation::new(match_id, average.clone(), sample_size);
        let writer = JsonlWriter::new(state.storage.annotations_path());
        tokio::spawn(async move {
            if let Err(e) = writer.append(&annotation) {
                warn!("Failed to record match rank annotation: {}", e);
            }
        });
    }

    Ok(Json(AverageResponse {
        average,
        sample_size,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::generator::MockGenerator;
    use crate::analysis::AnalysisCache;
    use crate::api::build_router;
    use crate::storage::{JsonlReader, LeaderboardStore, StorageConfig};
    use crate::sync::riot::MockLadderSource;
    use crate::sync::{RefreshConfig, RefreshOrchestrator};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
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

    async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
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
    async fn test_average_endpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());

        let app = build_router(state);
        let (status, json) = post_json(
            app,
            "/api/ranks/average",
            r#"{"ranks": ["GOLD II", "GOLD IV", null]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["average"], "Gold III");
        assert_eq!(json["sample_size"], 2);
    }

    #[tokio::test]
    async fn test_average_skips_unparsable_labels() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());

        let app = build_router(state);
        let (status, json) = post_json(
            app,
            "/api/ranks/average",
            r#"{"ranks": ["GOLD II", "WOOD V"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["average"], "Gold II");
        assert_eq!(json["sample_size"], 1);
    }

    #[tokio::test]
    async fn test_average_of_nothing_is_unranked() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());

        let app = build_router(state);
        let (status, json) = post_json(app, "/api/ranks/average", r#"{"ranks": []}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["average"], "Unranked");
        assert_eq!(json["sample_size"], 0);
    }

    #[tokio::test]
    async fn test_average_records_match_annotation() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let annotations_path = state.storage.annotations_path();

        let app = build_router(state);
        let (status, json) = post_json(
            app,
            "/api/ranks/average",
            r#"{"ranks": ["PLATINUM I", "PLATINUM III"], "match_id": "EUW1_42"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["average"], "Platinum II");

        // The annotation write runs off the response path.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let reader = JsonlReader::<MatchRankAnnotation>::new(annotations_path);
        let recorded = reader.read_all().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].match_id, "EUW1_42");
        assert_eq!(recorded[0].average, "Platinum II");
        assert_eq!(recorded[0].sample_size, 2);
    }

    #[tokio::test]
    async fn test_average_without_match_id_records_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let annotations_path = state.storage.annotations_path();

        let app = build_router(state);
        let (status, _) =
            post_json(app, "/api/ranks/average", r#"{"ranks": ["SILVER I"]}"#).await;

        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!annotations_path.exists());
    }
}
