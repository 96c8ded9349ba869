//! Model artifact loading and linear-regression inference
//!
//! A model artifact is a directory containing an `MLmodel` descriptor and a
//! `model.json` with the fitted intercept and per-feature coefficients. The
//! loader accepts three identifier forms: a filesystem path, a
//! `model-name@alias` registry reference, and a `runs:/<run-id>/<sub-path>`
//! run reference.

use crate::models::{FeatureRecord, FEATURE_NAMES};
use crate::resolver::FileStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// File name of the JSON model inside an artifact directory
pub const MODEL_FILE: &str = "model.json";

/// Errors from the artifact load primitive
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model artifact not found: {0}")]
    NotFound(String),
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Trait for prediction implementations
///
/// Implementations must be safe for concurrent read-only invocation; the
/// serving path shares a single predictor across all request handlers.
pub trait Predictor: Send + Sync + std::fmt::Debug {
    /// Compute a single scalar prediction from a validated feature record
    fn predict(&self, record: &FeatureRecord) -> anyhow::Result<f64>;

    /// Identify the loaded model (artifact path or registry reference)
    fn source(&self) -> &str;
}

/// Fitted linear-regression model, deserialized from `model.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub model_type: String,
    pub target: String,
    pub features: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(skip, default)]
    source: String,
}

impl LinearModel {
    /// Build a model directly from fitted parameters
    pub fn from_parameters(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            model_type: "linear_regression".to_string(),
            target: "price".to_string(),
            features: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            intercept,
            coefficients,
            source: "in-memory".to_string(),
        }
    }

    fn validate(&self) -> Result<(), LoadError> {
        if self.model_type != "linear_regression" {
            return Err(LoadError::Invalid(format!(
                "unsupported model_type {:?}",
                self.model_type
            )));
        }
        if self.features.len() != self.coefficients.len() {
            return Err(LoadError::Invalid(format!(
                "{} features but {} coefficients",
                self.features.len(),
                self.coefficients.len()
            )));
        }
        for name in &self.features {
            if !FEATURE_NAMES.contains(&name.as_str()) {
                return Err(LoadError::Invalid(format!("unknown feature {:?}", name)));
            }
        }
        if self.features.len() != FEATURE_NAMES.len() {
            return Err(LoadError::Invalid(format!(
                "model covers {} of {} required features",
                self.features.len(),
                FEATURE_NAMES.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(LoadError::Invalid("non-finite model parameters".to_string()));
        }
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn predict(&self, record: &FeatureRecord) -> anyhow::Result<f64> {
        let mut value = self.intercept;
        for (name, coefficient) in self.features.iter().zip(&self.coefficients) {
            let feature = record
                .feature(name)
                .ok_or_else(|| anyhow::anyhow!("record has no feature {:?}", name))?;
            value += coefficient * feature;
        }
        if !value.is_finite() {
            anyhow::bail!("prediction is not finite: {}", value);
        }
        Ok(value)
    }

    fn source(&self) -> &str {
        &self.source
    }
}

/// Load a model from an identifier string.
///
/// Registry and run references are looked up through the caller's file store;
/// anything else is treated as a filesystem path to a model directory.
pub fn load(identifier: &str, store: &FileStore) -> Result<LinearModel, LoadError> {
    debug!(identifier = %identifier, "Loading model artifact");

    if let Some(reference) = identifier.strip_prefix("runs:/") {
        let (run_id, sub_path) = reference
            .split_once('/')
            .ok_or_else(|| LoadError::Invalid(format!("malformed run reference {:?}", identifier)))?;
        let model_dir = store.run_artifact_dir(run_id)?.join(sub_path);
        return load_dir(&model_dir);
    }

    if let Some((name, alias)) = identifier.split_once('@') {
        let model_dir = store.alias_model_dir(name, alias)?;
        return load_dir(&model_dir);
    }

    load_dir(Path::new(identifier))
}

/// Load a model from an artifact directory containing `model.json`.
pub fn load_dir(model_dir: &Path) -> Result<LinearModel, LoadError> {
    let model_path = model_dir.join(MODEL_FILE);
    if !model_path.is_file() {
        return Err(LoadError::NotFound(model_dir.display().to_string()));
    }

    let bytes = std::fs::read(&model_path)?;
    let checksum = compute_checksum(&bytes);

    let mut model: LinearModel = serde_json::from_slice(&bytes)
        .map_err(|e| LoadError::Invalid(format!("{}: {}", model_path.display(), e)))?;
    model.validate()?;
    model.source = model_dir.display().to_string();

    info!(
        path = %model_path.display(),
        checksum = %checksum,
        size = bytes.len(),
        "Model artifact loaded"
    );

    Ok(model)
}

/// Compute SHA256 checksum of artifact bytes
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
