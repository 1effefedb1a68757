//! JSON query API.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use aimkg_rs::driver::{GraphStore, Neo4jStore};
use aimkg_rs::embedder::{AnyEmbedder, CachedEmbedder};
use aimkg_rs::search::browse::OPTIONS_LIMIT;
use aimkg_rs::search::{
    PresentationGraph, RecommendRequest, Recommendation, Recommender, SearchOptions,
    SearchRequest,
};
use aimkg_rs::AimkgError;

pub type AppRecommender = Recommender<Neo4jStore, CachedEmbedder<AnyEmbedder>>;
pub type AppState = Arc<AppRecommender>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/recommendation/query", post(recommend_handler))
        .route("/search/query", post(search_handler))
        .route("/search/options", get(options_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}

/// Maps library errors onto HTTP statuses with a stable error code.
#[derive(Debug)]
pub struct ApiError(pub AimkgError);

impl ApiError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AimkgError::IndexNotBuilt(_) => (StatusCode::SERVICE_UNAVAILABLE, "index_not_built"),
            AimkgError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AimkgError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<AimkgError> for ApiError {
    fn from(err: AimkgError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            error!(code, error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": code, "message": self.0.to_string() }))).into_response()
    }
}

async fn recommend_handler(
    State(recommender): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<Recommendation>, ApiError> {
    debug!(?req, "recommendation query");
    Ok(Json(recommender.recommend(&req).await?))
}

async fn search_handler(
    State(recommender): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Json<PresentationGraph> {
    debug!(?req, "search query");
    Json(recommender.search(&req).await)
}

#[derive(Debug, Deserialize)]
struct OptionsParams {
    limit: Option<usize>,
}

async fn options_handler(
    State(recommender): State<AppState>,
    Query(params): Query<OptionsParams>,
) -> Json<SearchOptions> {
    Json(recommender.options(params.limit.unwrap_or(OPTIONS_LIMIT)).await)
}

/// Liveness probe: returns 200 as long as the process is running.
async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: returns 200 if the graph store answers.
async fn ready_handler(State(recommender): State<AppState>) -> impl IntoResponse {
    match recommender.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
