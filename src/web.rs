//! Read-only JSON API over the restock log
//!
//! Intended for dashboards such as a Home Assistant REST sensor.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::analyzer::Patterns;
use crate::error::{Error, Result};
use crate::models::{Observation, RestockEvent};
use crate::predictor::Prediction;
use crate::tracker::RestockTracker;

/// History query parameters
#[derive(Deserialize)]
struct HistoryParams {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

fn respond<T>(result: Result<T>) -> ApiResult<T> {
    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        ),
        Err(e) => {
            let status = match e {
                Error::InvalidKey { .. } => StatusCode::BAD_REQUEST,
                _ => {
                    log::error!("API error: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                Json(ApiResponse {
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

/// GET /api/patterns/{store_id}/{product_id}
async fn patterns_handler(
    State(tracker): State<RestockTracker>,
    Path((store_id, product_id)): Path<(String, String)>,
) -> ApiResult<Patterns> {
    respond(tracker.get_patterns(&store_id, &product_id))
}

/// GET /api/predict/{store_id}/{product_id}
async fn predict_handler(
    State(tracker): State<RestockTracker>,
    Path((store_id, product_id)): Path<(String, String)>,
) -> ApiResult<Prediction> {
    respond(tracker.predict_next_restock(&store_id, &product_id))
}

/// GET /api/history/{store_id}/{product_id}?limit={limit}
async fn history_handler(
    State(tracker): State<RestockTracker>,
    Path((store_id, product_id)): Path<(String, String)>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Vec<Observation>> {
    respond(tracker.observation_history(&store_id, &product_id, params.limit))
}

/// GET /api/restocks/{store_id}/{product_id}
async fn restocks_handler(
    State(tracker): State<RestockTracker>,
    Path((store_id, product_id)): Path<(String, String)>,
) -> ApiResult<Vec<RestockEvent>> {
    respond(tracker.restock_events(&store_id, &product_id))
}

/// Build the API router
pub fn create_router(tracker: RestockTracker) -> Router {
    Router::new()
        .route("/api/patterns/{store_id}/{product_id}", get(patterns_handler))
        .route("/api/predict/{store_id}/{product_id}", get(predict_handler))
        .route("/api/history/{store_id}/{product_id}", get(history_handler))
        .route("/api/restocks/{store_id}/{product_id}", get(restocks_handler))
        .with_state(tracker)
}

/// Start the API server
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
pub async fn serve(tracker: RestockTracker, port: u16) -> std::io::Result<()> {
    let app = create_router(tracker);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
