//! Serving library for the house price model
//!
//! This crate provides the core functionality for:
//! - Artifact resolution (explicit URI, registry alias, latest run, directory scan)
//! - Model loading and linear-regression inference
//! - The prediction service state machine
//! - Metrics and structured logging

pub mod models;
pub mod observability;
pub mod predictor;
pub mod resolver;
pub mod service;

pub use models::{FeatureRecord, Prediction, CURRENCY};
pub use observability::{ServingMetrics, StructuredLogger};
pub use predictor::{LinearModel, LoadError, Predictor};
pub use resolver::{resolve, FileStore, ResolutionError, ResolutionStrategy};
pub use service::{HealthReport, PredictError, PredictionService, ServiceStatus};
