use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub match_id: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub match_id: String,
    pub analysis: String,
    /// True when the text came from the cache instead of the backend.
    pub cached: bool,
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(params): Json<AnalyzeParams>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let match_id = params
        .match_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("match_id is required".to_string()))?;
    let prompt = params
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("prompt is required".to_string()))?;

    let generator = state.generator.clone();
    let (analysis, cached) = state
        .cache
        .get_or_compute(&match_id, || async move { generator.generate(&prompt).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(AnalyzeResponse {
        match_id,
        analysis,
        cached,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::generator::MockGenerator;
    use crate::analysis::AnalysisCache;
    use crate::api::build_router;
    use crate::storage::{LeaderboardStore, StorageConfig};
    use crate::sync::riot::MockLadderSource;
    use crate::sync::{RefreshConfig, RefreshOrchestrator};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn setup_with_generator(dir: &std::path::Path, generator: Arc<MockGenerator>) -> AppState {
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
            generator,
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
    async fn test_analysis_is_cached_per_match() {
        let tmp = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator::new("Strong early rotations."));
        let state = setup_with_generator(tmp.path(), generator.clone());

        let body = r#"{"match_id": "EUW1_77", "prompt": "Summarize the match"}"#;

        let app = build_router(state.clone());
        let (status, first) = post_json(app, "/api/analysis", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["match_id"], "EUW1_77");
        assert_eq!(first["analysis"], "Strong early rotations.");
        assert_eq!(first["cached"], false);

        let app = build_router(state);
        let (status, second) = post_json(app, "/api/analysis", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["analysis"], "Strong early rotations.");
        assert_eq!(second["cached"], true);

        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_analysis_distinct_matches_recompute() {
        let tmp = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator::new("Uneven laning phase."));
        let state = setup_with_generator(tmp.path(), generator.clone());

        let app = build_router(state.clone());
        let (_, first) = post_json(
            app,
            "/api/analysis",
            r#"{"match_id": "EUW1_1", "prompt": "Summarize"}"#,
        )
        .await;
        let app = build_router(state);
        let (_, second) = post_json(
            app,
            "/api/analysis",
            r#"{"match_id": "EUW1_2", "prompt": "Summarize"}"#,
        )
        .await;

        assert_eq!(first["cached"], false);
        assert_eq!(second["cached"], false);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_analysis_requires_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let generator = Arc::new(MockGenerator::new("unused"));
        let state = setup_with_generator(tmp.path(), generator);

        let cases = [
            r#"{}"#,
            r#"{"match_id": "", "prompt": "Summarize"}"#,
            r#"{"match_id": "EUW1_9", "prompt": "  "}"#,
        ];

        for body in cases {
            let app = build_router(state.clone());
            let (status, json) = post_json(app, "/api/analysis", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(json["error"]["code"], "BAD_REQUEST", "body: {}", body);
        }
    }
}
