//! Prediction service state machine
//!
//! Owns the lifecycle of one resolved predictor per process. The service is
//! built exactly once at startup, before the listener accepts requests, and is
//! immutable afterwards: Ready holds the predictor, Degraded holds the
//! resolution error, and neither transitions again without a restart.

use crate::models::{FeatureRecord, Prediction};
use crate::predictor::Predictor;
use crate::resolver::{self, FileStore, ResolutionStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Lifecycle state of the prediction service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Uninitialized,
    Ready,
    Degraded,
}

/// Why a prediction request failed
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("model is not loaded")]
    Unavailable,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("prediction failed: {0}")]
    ComputeFailure(String),
}

/// Health report returned by the health endpoint. Always serializable,
/// regardless of service state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub model_loaded: bool,
}

/// Process-wide serving state: one predictor or one resolution error,
/// set once and read-only thereafter.
pub struct PredictionService {
    predictor: Option<Arc<dyn Predictor>>,
    resolution_error: Option<String>,
    initialized: bool,
}

impl PredictionService {
    /// A service that has not attempted resolution yet. Denies predictions.
    pub fn uninitialized() -> Self {
        Self {
            predictor: None,
            resolution_error: None,
            initialized: false,
        }
    }

    /// Resolve the model once and fix the outcome for the process lifetime.
    ///
    /// A resolution failure leaves the service Degraded but running; it is
    /// logged here and never propagated as a process error.
    pub fn initialize(strategy: &ResolutionStrategy, store: &FileStore) -> Self {
        match resolver::resolve(strategy, store) {
            Ok(predictor) => {
                info!(source = %predictor.source(), "Prediction service ready");
                Self {
                    predictor: Some(predictor),
                    resolution_error: None,
                    initialized: true,
                }
            }
            Err(err) => {
                error!(error = %err, strategy = %strategy, "Model resolution failed, serving degraded");
                Self {
                    predictor: None,
                    resolution_error: Some(err.to_string()),
                    initialized: true,
                }
            }
        }
    }

    /// A service that is Ready with the given predictor
    pub fn with_predictor(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor: Some(predictor),
            resolution_error: None,
            initialized: true,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        if !self.initialized {
            ServiceStatus::Uninitialized
        } else if self.predictor.is_some() {
            ServiceStatus::Ready
        } else {
            ServiceStatus::Degraded
        }
    }

    /// Stored detail from a failed resolution, if any
    pub fn resolution_error(&self) -> Option<&str> {
        self.resolution_error.as_deref()
    }

    /// Health snapshot. Never fails and has no side effects.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_string(),
            model_loaded: self.status() == ServiceStatus::Ready,
        }
    }

    /// Validate a payload and compute a prediction.
    ///
    /// The state precondition is checked first, then the schema; the predictor
    /// is only invoked for a fully validated record.
    pub fn predict(&self, payload: &serde_json::Value) -> Result<Prediction, PredictError> {
        let predictor = match self.status() {
            ServiceStatus::Ready => self.predictor.as_ref().ok_or(PredictError::Unavailable)?,
            _ => return Err(PredictError::Unavailable),
        };

        let record = FeatureRecord::from_value(payload)
            .map_err(|e| PredictError::InvalidInput(e.to_string()))?;

        let value = predictor
            .predict(&record)
            .map_err(|e| PredictError::ComputeFailure(e.to_string()))?;

        Ok(Prediction::new(value))
    }
}
