//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use serving_lib::{PredictError, PredictionService, ServingMetrics, StructuredLogger};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub metrics: ServingMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        service: Arc<PredictionService>,
        metrics: ServingMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            service,
            metrics,
            logger,
        }
    }
}

/// Static liveness message - always 200
async fn home() -> impl IntoResponse {
    Json(json!({ "message": "house price model API is running" }))
}

/// Health check - always 200, reports whether the model loaded
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.health())
}

/// Prediction endpoint.
///
/// 200 with `{prediction, currency}` on success, 503 while no model is
/// loaded, 400 for schema or compute failures.
async fn predict(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let start = Instant::now();

    match state.service.predict(&payload) {
        Ok(prediction) => {
            let elapsed = start.elapsed().as_secs_f64();
            state.metrics.observe_prediction_latency(elapsed);
            state.metrics.inc_predictions_served();
            state.logger.log_prediction(prediction.prediction, elapsed);
            (StatusCode::OK, Json(json!(prediction)))
        }
        Err(err) => {
            let status = match &err {
                PredictError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                PredictError::InvalidInput(_) | PredictError::ComputeFailure(_) => {
                    StatusCode::BAD_REQUEST
                }
            };
            if matches!(err, PredictError::InvalidInput(_)) {
                state.metrics.inc_invalid_requests();
            } else {
                state.metrics.inc_prediction_errors();
            }
            state.logger.log_prediction_rejected(&err.to_string());
            (status, Json(json!({ "error": err.to_string() })))
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
