//! HTTP routes over the reachability engine

use std::sync::Arc;
use std::time::Duration;

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower::{ServiceBuilder, limit::GlobalConcurrencyLimitLayer, timeout::TimeoutLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};
use walkshed_core::{
    Error, NodeId, TestRoadId, WalkingTime,
    engine::{Engine, QueryResult, TestRoadInfo},
    loading::Snapshot,
    model::LngLat,
    overlay::EnhancementReport,
};

use crate::config::ServerConfig;

pub type AppState = Arc<Engine>;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub origin_id: NodeId,
    pub max_time_seconds: WalkingTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRequest {
    pub origin_id: NodeId,
    pub target_id: NodeId,
    pub max_time_seconds: WalkingTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestRoadRequest {
    pub start: LngLat,
    pub end: LngLat,
    /// Surveyed length in meters; straight-line distance when omitted
    pub length: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRoadsQuery {
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRequest {
    pub lng: f64,
    pub lat: f64,
    #[serde(default)]
    pub is_boundary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRequest {
    pub from: NodeId,
    pub to: NodeId,
    pub length: f64,
}

// ============================================================================
// Error mapping
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Engine(Error),
    NotFound(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::Engine(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Engine(error) => {
                let status = match &error {
                    Error::OriginNotFound(_) => StatusCode::NOT_FOUND,
                    Error::Unreachable(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    Error::EdgeEndpointMissing(_)
                    | Error::SelfLoop(_)
                    | Error::InvalidLength(_)
                    | Error::FormatError(_) => StatusCode::BAD_REQUEST,
                    Error::IoError(_) | Error::GeoJsonError(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, error.to_string())
            }
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        if status.is_server_error() {
            warn!(%status, "{message}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Runs CPU-bound engine work off the async executor
async fn blocking<T, F>(engine: AppState, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Engine) -> Result<T, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(engine.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("Engine task failed: {e}")))?
        .map_err(ApiError::from)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health(State(engine): State<AppState>) -> Json<serde_json::Value> {
    let network = engine.network();
    Json(json!({
        "status": "ok",
        "nodes": network.node_count(),
        "edges": network.edge_count(),
    }))
}

async fn search(
    State(engine): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    debug!(origin = %request.origin_id, budget = request.max_time_seconds, "search");
    blocking(engine, move |engine| {
        engine.search(request.origin_id, request.max_time_seconds)
    })
    .await
    .map(Json)
}

async fn enhanced(
    State(engine): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<QueryResult>, ApiError> {
    debug!(origin = %request.origin_id, budget = request.max_time_seconds, "enhanced search");
    blocking(engine, move |engine| {
        engine.compute_enhanced(request.origin_id, request.max_time_seconds)
    })
    .await
    .map(Json)
}

async fn compare(
    State(engine): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<EnhancementReport>, ApiError> {
    blocking(engine, move |engine| {
        engine.compare(request.origin_id, request.max_time_seconds)
    })
    .await
    .map(Json)
}

async fn walking_path(
    State(engine): State<AppState>,
    Json(request): Json<PathRequest>,
) -> Result<Json<geojson::Feature>, ApiError> {
    blocking(engine, move |engine| {
        engine.walking_path(request.origin_id, request.target_id, request.max_time_seconds)
    })
    .await
    .map(Json)
}

async fn list_test_roads(
    State(engine): State<AppState>,
    Query(query): Query<ListRoadsQuery>,
) -> Json<Vec<TestRoadInfo>> {
    Json(engine.list_test_roads(query.include_deleted))
}

async fn add_test_road(
    State(engine): State<AppState>,
    Json(request): Json<TestRoadRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = match request.length {
        Some(length) => engine.add_test_road_with_length(request.start, request.end, length)?,
        None => engine.add_test_road(request.start, request.end),
    };
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn remove_test_road(
    State(engine): State<AppState>,
    Path(id): Path<TestRoadId>,
) -> Result<StatusCode, ApiError> {
    if engine.remove_test_road(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No active test road {id}")))
    }
}

async fn restore_test_road(
    State(engine): State<AppState>,
    Path(id): Path<TestRoadId>,
) -> Result<StatusCode, ApiError> {
    if engine.restore_test_road(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No deleted test road {id}")))
    }
}

async fn add_node(
    State(engine): State<AppState>,
    Json(request): Json<NodeRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let id = engine.add_node(LngLat::new(request.lng, request.lat), request.is_boundary);
    (StatusCode::CREATED, Json(json!({ "id": id })))
}

async fn remove_node(State(engine): State<AppState>, Path(id): Path<NodeId>) -> StatusCode {
    // Removing an absent node is a no-op, not an error
    engine.remove_node(id);
    StatusCode::NO_CONTENT
}

async fn add_edge(
    State(engine): State<AppState>,
    Json(request): Json<EdgeRequest>,
) -> Result<StatusCode, ApiError> {
    engine.add_edge(request.from, request.to, request.length)?;
    Ok(StatusCode::CREATED)
}

async fn remove_edge(
    State(engine): State<AppState>,
    Path((a, b)): Path<(NodeId, NodeId)>,
) -> StatusCode {
    engine.remove_edge(a, b);
    StatusCode::NO_CONTENT
}

async fn export_snapshot(State(engine): State<AppState>) -> Json<Snapshot> {
    Json(engine.export_snapshot())
}

async fn import_snapshot(
    State(engine): State<AppState>,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    blocking(engine, move |engine| {
        let snapshot = Snapshot::from_json(&body)?;
        engine.import_snapshot(&snapshot)?;
        let network = engine.network();
        Ok(json!({ "nodes": network.node_count(), "edges": network.edge_count() }))
    })
    .await
    .map(Json)
}

async fn handle_middleware_error(error: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if error.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "request timed out" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": error.to_string() })),
        )
    }
}

/// Builds the application router
pub fn router(engine: AppState, config: &ServerConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(GlobalConcurrencyLimitLayer::new(config.concurrency_limit));

    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/enhanced", post(enhanced))
        .route("/compare", post(compare))
        .route("/path", post(walking_path))
        .route("/test-roads", get(list_test_roads).post(add_test_road))
        .route("/test-roads/{id}", delete(remove_test_road))
        .route("/test-roads/{id}/restore", post(restore_test_road))
        .route("/nodes", post(add_node))
        .route("/nodes/{id}", delete(remove_node))
        .route("/edges", post(add_edge))
        .route("/edges/{a}/{b}", delete(remove_edge))
        .route("/snapshot", get(export_snapshot).put(import_snapshot))
        .layer(middleware)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}
