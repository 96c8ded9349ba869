//! Integration tests for the prediction API endpoints

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use serving_lib::{
    FileStore, PredictError, PredictionService, ResolutionStrategy, ServingMetrics,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub metrics: ServingMetrics,
}

async fn home() -> impl IntoResponse {
    Json(json!({ "message": "house price model API is running" }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.health())
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    match state.service.predict(&payload) {
        Ok(prediction) => {
            state.metrics.inc_predictions_served();
            (StatusCode::OK, Json(json!(prediction)))
        }
        Err(err) => {
            let status = match &err {
                PredictError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                PredictError::InvalidInput(_) | PredictError::ComputeFailure(_) => {
                    StatusCode::BAD_REQUEST
                }
            };
            (status, Json(json!({ "error": err.to_string() })))
        }
    }
}

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

fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .with_state(state)
}

fn write_artifact(model_dir: &Path) {
    std::fs::create_dir_all(model_dir).unwrap();
    std::fs::write(model_dir.join("MLmodel"), "artifact_path: model\n").unwrap();
    let model = json!({
        "model_type": "linear_regression",
        "target": "price",
        "features": ["area", "bedrooms", "bathrooms", "stories", "mainroad", "guestroom"],
        "intercept": 100000.0,
        "coefficients": [300.0, 50000.0, 40000.0, 25000.0, 30000.0, 20000.0]
    });
    std::fs::write(
        model_dir.join("model.json"),
        serde_json::to_vec_pretty(&model).unwrap(),
    )
    .unwrap();
}

/// App backed by a real artifact on disk, resolved through DirectoryScan
fn setup_ready_app() -> (Router, Arc<AppState>, TempDir) {
    let tmp = TempDir::new().unwrap();
    write_artifact(&tmp.path().join("run1/artifacts/model"));

    let store = FileStore::new(tmp.path());
    let strategy = ResolutionStrategy::DirectoryScan {
        root: tmp.path().to_path_buf(),
    };
    let service = Arc::new(PredictionService::initialize(&strategy, &store));
    assert!(service.health().model_loaded);

    let state = Arc::new(AppState {
        service,
        metrics: ServingMetrics::new(),
    });
    let router = create_test_router(state.clone());
    (router, state, tmp)
}

/// App whose resolution failed: root exists but holds no artifact
fn setup_degraded_app() -> (Router, Arc<AppState>, TempDir) {
    let tmp = TempDir::new().unwrap();
    let store = FileStore::new(tmp.path());
    let strategy = ResolutionStrategy::DirectoryScan {
        root: tmp.path().to_path_buf(),
    };
    let service = Arc::new(PredictionService::initialize(&strategy, &store));
    assert!(!service.health().model_loaded);

    let state = Arc::new(AppState {
        service,
        metrics: ServingMetrics::new(),
    });
    let router = create_test_router(state.clone());
    (router, state, tmp)
}

fn valid_payload() -> Value {
    json!({
        "area": 3000.0,
        "bedrooms": 3,
        "bathrooms": 2,
        "stories": 1,
        "mainroad": 1,
        "guestroom": 0
    })
}

fn predict_request(payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_home_returns_liveness_message() {
    let (app, _state, _tmp) = setup_ready_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn test_health_reports_model_loaded() {
    let (app, _state, _tmp) = setup_ready_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["model_loaded"], true);
}

#[tokio::test]
async fn test_health_still_200_when_degraded() {
    let (app, _state, _tmp) = setup_degraded_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_returns_price_in_usd() {
    let (app, _state, _tmp) = setup_ready_app();

    let response = app.oneshot(predict_request(&valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["currency"], "USD");

    // Regression sanity bound against the fixture coefficients
    let prediction = body["prediction"].as_f64().unwrap();
    assert!(prediction > 100_000.0 && prediction < 15_000_000.0);
}

#[tokio::test]
async fn test_predict_missing_field_is_400() {
    let (app, _state, _tmp) = setup_ready_app();

    let mut payload = valid_payload();
    payload.as_object_mut().unwrap().remove("bedrooms");

    let response = app.oneshot(predict_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("invalid input"));
}

#[tokio::test]
async fn test_predict_unknown_field_is_400() {
    let (app, _state, _tmp) = setup_ready_app();

    let mut payload = valid_payload();
    payload["swimming_pool"] = json!(1);

    let response = app.oneshot(predict_request(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_degraded_is_503() {
    let (app, _state, _tmp) = setup_degraded_app();

    let response = app.oneshot(predict_request(&valid_payload())).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not loaded"));
}

#[tokio::test]
async fn test_concurrent_predictions_are_identical() {
    let (app, _state, _tmp) = setup_ready_app();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let response = app.oneshot(predict_request(&valid_payload())).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await["prediction"].as_f64().unwrap()
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state, _tmp) = setup_ready_app();

    state.metrics.observe_prediction_latency(0.001);
    state.metrics.inc_predictions_served();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("price_server_prediction_latency_seconds"));
    assert!(metrics_text.contains("price_server_predictions_served_total"));
}
