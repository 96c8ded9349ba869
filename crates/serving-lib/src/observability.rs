//! Observability infrastructure for the serving path
//!
//! Provides:
//! - Prometheus metrics (prediction latency, request counters, model info)
//! - Structured JSON event logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_gauge, GaugeVec, Histogram, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServingMetricsInner> = OnceLock::new();

struct ServingMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_served: IntGauge,
    prediction_errors: IntGauge,
    invalid_requests: IntGauge,
    model_info: GaugeVec,
}

impl ServingMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "price_server_prediction_latency_seconds",
                "Time spent computing a prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_served: register_int_gauge!(
                "price_server_predictions_served_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_served"),

            prediction_errors: register_int_gauge!(
                "price_server_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors"),

            invalid_requests: register_int_gauge!(
                "price_server_invalid_requests_total",
                "Total number of requests rejected by schema validation"
            )
            .expect("Failed to register invalid_requests"),

            model_info: register_gauge_vec!(
                "price_server_model_info",
                "Information about the currently loaded model",
                &["source", "status"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Serving metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServingMetrics {
    _private: (),
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServingMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServingMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a prediction latency observation
    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Increment the successful prediction counter
    pub fn inc_predictions_served(&self) {
        self.inner().predictions_served.inc();
    }

    /// Increment the failed prediction counter
    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    /// Increment the schema-rejection counter
    pub fn inc_invalid_requests(&self) {
        self.inner().invalid_requests.inc();
    }

    /// Record the resolved model source and serving status
    pub fn set_model_info(&self, source: &str, status: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[source, status])
            .set(1.0);
    }
}

/// Structured logger for serving events
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Log server startup with the active resolution strategy
    pub fn log_startup(&self, version: &str, strategy: &str) {
        info!(
            event = "server_started",
            service = %self.service_name,
            server_version = %version,
            strategy = %strategy,
            "Prediction server started"
        );
    }

    /// Log a successful model resolution
    pub fn log_model_resolved(&self, source: &str) {
        info!(
            event = "model_resolved",
            service = %self.service_name,
            source = %source,
            "Model resolved and loaded"
        );
    }

    /// Log a failed resolution; the server keeps running degraded
    pub fn log_resolution_failed(&self, detail: &str) {
        error!(
            event = "model_resolution_failed",
            service = %self.service_name,
            detail = %detail,
            "Model resolution failed, predictions disabled"
        );
    }

    /// Log a served prediction
    pub fn log_prediction(&self, prediction: f64, latency_secs: f64) {
        info!(
            event = "prediction_served",
            service = %self.service_name,
            prediction = prediction,
            latency_secs = latency_secs,
            "Prediction served"
        );
    }

    /// Log a rejected prediction request
    pub fn log_prediction_rejected(&self, reason: &str) {
        warn!(
            event = "prediction_rejected",
            service = %self.service_name,
            reason = %reason,
            "Prediction request rejected"
        );
    }

    /// Log server shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Prediction server shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handle_records() {
        let metrics = ServingMetrics::new();
        metrics.observe_prediction_latency(0.002);
        metrics.inc_predictions_served();
        metrics.inc_prediction_errors();
        metrics.inc_invalid_requests();
        metrics.set_model_info("/tmp/model", "ready");
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("price-server");
        assert_eq!(logger.service_name, "price-server");
    }
}
