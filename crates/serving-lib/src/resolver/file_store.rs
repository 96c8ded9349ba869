//! MLflow-style file-store conventions
//!
//! Runs live at `<root>/<experiment_id>/<run_id>/` with a `meta.yaml` holding
//! `run_id:` and `start_time:` (epoch millis) and artifacts under `artifacts/`.
//! The registry lives at `<root>/models/<name>/` with alias files under
//! `aliases/` naming a version and `version-<N>/meta.yaml` pointing at the
//! stored model directory. The meta files are flat `key: value` lines.

use crate::predictor::LoadError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the store root holding the model registry
pub const REGISTRY_DIR: &str = "models";

/// A single run under an experiment
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: String,
    pub start_time: i64,
    pub path: PathBuf,
}

/// Handle to an mlruns-style file store
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List runs under an experiment, newest first.
    ///
    /// Runs missing a parseable `meta.yaml` are skipped. A missing experiment
    /// directory yields an empty list, not an error.
    pub fn list_runs(&self, experiment_id: &str) -> Result<Vec<RunInfo>, LoadError> {
        let experiment_dir = self.root.join(experiment_id);
        if !experiment_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in std::fs::read_dir(&experiment_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let meta_path = path.join("meta.yaml");
            if !meta_path.is_file() {
                continue;
            }
            let meta = parse_meta(&meta_path)?;
            let run_id = meta
                .get("run_id")
                .cloned()
                .unwrap_or_else(|| entry.file_name().to_string_lossy().to_string());
            let start_time = meta
                .get("start_time")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(0);
            runs.push(RunInfo {
                run_id,
                start_time,
                path,
            });
        }

        // Newest first; run id breaks ties so ordering is stable
        runs.sort_by(|a, b| {
            b.start_time
                .cmp(&a.start_time)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });

        debug!(
            experiment_id = %experiment_id,
            count = runs.len(),
            "Listed experiment runs"
        );
        Ok(runs)
    }

    /// Locate a run's `artifacts/` directory by run id, searching every
    /// experiment under the root.
    pub fn run_artifact_dir(&self, run_id: &str) -> Result<PathBuf, LoadError> {
        if self.root.is_dir() {
            for entry in std::fs::read_dir(&self.root)? {
                let entry = entry?;
                let path = entry.path();
                if !path.is_dir() || entry.file_name() == REGISTRY_DIR {
                    continue;
                }
                let candidate = path.join(run_id);
                if candidate.join("meta.yaml").is_file() {
                    return Ok(candidate.join("artifacts"));
                }
            }
        }
        Err(LoadError::NotFound(format!("run {}", run_id)))
    }

    /// Resolve a registered model alias to its stored model directory.
    pub fn alias_model_dir(&self, name: &str, alias: &str) -> Result<PathBuf, LoadError> {
        let model_dir = self.root.join(REGISTRY_DIR).join(name);
        if !model_dir.is_dir() {
            return Err(LoadError::NotFound(format!("registered model {}", name)));
        }

        let alias_path = model_dir.join("aliases").join(alias);
        if !alias_path.is_file() {
            return Err(LoadError::NotFound(format!("alias {}@{}", name, alias)));
        }
        let version = std::fs::read_to_string(&alias_path)?.trim().to_string();

        let version_meta = model_dir.join(format!("version-{}", version)).join("meta.yaml");
        if !version_meta.is_file() {
            return Err(LoadError::NotFound(format!(
                "version {} of model {}",
                version, name
            )));
        }
        let meta = parse_meta(&version_meta)?;
        let location = meta
            .get("storage_location")
            .or_else(|| meta.get("source"))
            .ok_or_else(|| {
                LoadError::Invalid(format!(
                    "{} has no storage_location",
                    version_meta.display()
                ))
            })?;

        Ok(resolve_location(location, &self.root))
    }
}

/// Parse a flat `key: value` meta file. Indented lines and lines without a
/// colon are ignored.
fn parse_meta(path: &Path) -> Result<HashMap<String, String>, LoadError> {
    let content = std::fs::read_to_string(path)?;
    let mut values = HashMap::new();
    for line in content.lines() {
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    Ok(values)
}

/// Normalize a storage location to a path, stripping a `file://` scheme and
/// anchoring relative locations at the store root.
fn resolve_location(location: &str, root: &Path) -> PathBuf {
    let location = location.strip_prefix("file://").unwrap_or(location);
    let path = Path::new(location);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
