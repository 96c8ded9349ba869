//! Artifact resolution
//!
//! Given a resolution strategy, locates a single loadable model artifact and
//! returns a ready-to-use predictor. Resolution runs at most once per process,
//! performs no writes, and never retries; every failure maps to a
//! [`ResolutionError`] so the caller can degrade instead of crash.

mod file_store;
mod scan;

pub use file_store::{FileStore, RunInfo};
pub use scan::{find_model_dir, MODEL_MARKER};

use crate::predictor::{self, LoadError, Predictor};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// How to locate the trained model artifact. Exactly one strategy is active
/// per process, chosen from configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Load directly from an identifier (path, `name@alias`, or `runs:/...`)
    ExplicitUri { uri: String },
    /// Look up a registered model version through its alias
    RegistryAlias { model_name: String, alias: String },
    /// Pick the newest run under an experiment
    LatestRun { experiment_id: String },
    /// Walk a directory tree for the first `MLmodel` marker
    DirectoryScan { root: PathBuf },
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExplicitUri { uri } => write!(f, "uri:{}", uri),
            Self::RegistryAlias { model_name, alias } => {
                write!(f, "registry:{}@{}", model_name, alias)
            }
            Self::LatestRun { experiment_id } => write!(f, "latest-run:{}", experiment_id),
            Self::DirectoryScan { root } => write!(f, "scan:{}", root.display()),
        }
    }
}

/// Why resolution failed. All variants are non-fatal to the process.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no model artifact found")]
    NotFound,
    #[error("artifact root does not exist: {0}")]
    RootMissing(PathBuf),
    #[error("model load failed: {0}")]
    LoadFailed(String),
}

impl From<LoadError> for ResolutionError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound(_) => ResolutionError::NotFound,
            other => ResolutionError::LoadFailed(other.to_string()),
        }
    }
}

/// Resolve a strategy to a loaded predictor.
///
/// Registry and run lookups go through the caller-supplied file store; the
/// resolver itself only inspects paths and delegates loading to
/// [`predictor::load`].
pub fn resolve(
    strategy: &ResolutionStrategy,
    store: &FileStore,
) -> Result<Arc<dyn Predictor>, ResolutionError> {
    info!(strategy = %strategy, "Resolving model artifact");

    let model = match strategy {
        ResolutionStrategy::ExplicitUri { uri } => predictor::load(uri, store)?,

        ResolutionStrategy::RegistryAlias { model_name, alias } => {
            let reference = format!("{}@{}", model_name, alias);
            predictor::load(&reference, store)?
        }

        ResolutionStrategy::LatestRun { experiment_id } => {
            let runs = store.list_runs(experiment_id)?;
            let latest = runs.first().ok_or(ResolutionError::NotFound)?;
            info!(
                run_id = %latest.run_id,
                start_time = latest.start_time,
                "Selected latest run"
            );
            let reference = format!("runs:/{}/model", latest.run_id);
            predictor::load(&reference, store)?
        }

        ResolutionStrategy::DirectoryScan { root } => {
            if !root.exists() {
                return Err(ResolutionError::RootMissing(root.clone()));
            }
            let model_dir = find_model_dir(root)
                .map_err(|e| ResolutionError::LoadFailed(e.to_string()))?
                .ok_or(ResolutionError::NotFound)?;
            predictor::load_dir(&model_dir)?
        }
    };

    info!(source = %model.source(), "Model resolved");
    Ok(Arc::new(model))
}
