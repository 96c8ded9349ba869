//! Writes training output in the mlruns file-store layout
//!
//! Produces the run directory, its `meta.yaml`, the `MLmodel` descriptor and
//! `model.json` artifact, and optionally registers a model version with an
//! alias so the serving side can resolve it by reference.

use anyhow::{Context, Result};
use serving_lib::LinearModel;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths produced by a logged run
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub model_dir: PathBuf,
}

/// Write a finished run with its model artifact under the store root.
pub fn log_run(
    root: &Path,
    experiment_id: &str,
    model: &LinearModel,
    r2_score: f64,
) -> Result<RunPaths> {
    let run_id = generate_run_id(experiment_id);
    let now_millis = chrono::Utc::now().timestamp_millis();

    let experiment_dir = root.join(experiment_id);
    let run_dir = experiment_dir.join(&run_id);
    let model_dir = run_dir.join("artifacts").join("model");
    fs::create_dir_all(&model_dir)
        .with_context(|| format!("failed to create run directory {}", run_dir.display()))?;

    write_experiment_meta(&experiment_dir, experiment_id)?;

    fs::write(
        run_dir.join("meta.yaml"),
        format!(
            "run_id: {run_id}\n\
             experiment_id: {experiment_id}\n\
             status: FINISHED\n\
             start_time: {now_millis}\n\
             end_time: {now_millis}\n\
             artifact_uri: {artifacts}\n\
             lifecycle_stage: active\n",
            artifacts = run_dir.join("artifacts").display(),
        ),
    )?;

    let metrics_dir = run_dir.join("metrics");
    fs::create_dir_all(&metrics_dir)?;
    fs::write(
        metrics_dir.join("r2_score"),
        format!("{} {} 0\n", now_millis, r2_score),
    )?;

    let params_dir = run_dir.join("params");
    fs::create_dir_all(&params_dir)?;
    fs::write(params_dir.join("model_type"), &model.model_type)?;

    fs::write(
        model_dir.join("MLmodel"),
        format!(
            "artifact_path: model\n\
             run_id: {run_id}\n\
             utc_time_created: {created}\n\
             flavors:\n  \
               price_linear:\n    \
                 format: json\n    \
                 data: model.json\n",
            created = chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    write_model_json(&model_dir, model)?;

    info!(
        run_id = %run_id,
        r2_score = r2_score,
        model_dir = %model_dir.display(),
        "Training run logged"
    );

    Ok(RunPaths {
        run_id,
        run_dir,
        model_dir,
    })
}

/// Register a new version of a named model and optionally point an alias at
/// it. Returns the assigned version number.
pub fn register_model(
    root: &Path,
    name: &str,
    storage_location: &Path,
    alias: Option<&str>,
) -> Result<u32> {
    let model_root = root.join("models").join(name);
    fs::create_dir_all(&model_root)?;

    let meta_path = model_root.join("meta.yaml");
    if !meta_path.exists() {
        fs::write(&meta_path, format!("name: {}\n", name))?;
    }

    let version = next_version(&model_root)?;
    let version_dir = model_root.join(format!("version-{}", version));
    fs::create_dir_all(&version_dir)?;
    fs::write(
        version_dir.join("meta.yaml"),
        format!(
            "name: {name}\n\
             version: {version}\n\
             creation_timestamp: {now}\n\
             storage_location: {location}\n",
            now = chrono::Utc::now().timestamp_millis(),
            location = storage_location.display(),
        ),
    )?;

    if let Some(alias) = alias {
        let aliases_dir = model_root.join("aliases");
        fs::create_dir_all(&aliases_dir)?;
        fs::write(aliases_dir.join(alias), version.to_string())?;
        info!(model = %name, alias = %alias, version = version, "Alias assigned");
    }

    info!(model = %name, version = version, "Model version registered");
    Ok(version)
}

fn write_experiment_meta(experiment_dir: &Path, experiment_id: &str) -> Result<()> {
    let meta_path = experiment_dir.join("meta.yaml");
    if meta_path.exists() {
        return Ok(());
    }
    fs::write(
        &meta_path,
        format!(
            "experiment_id: {experiment_id}\n\
             name: house_price_experiment\n\
             artifact_location: {location}\n\
             lifecycle_stage: active\n",
            location = experiment_dir.display(),
        ),
    )?;
    Ok(())
}

/// Write `model.json` via a temp file so a crash never leaves a partial
/// artifact behind the `MLmodel` marker.
fn write_model_json(model_dir: &Path, model: &LinearModel) -> Result<()> {
    let final_path = model_dir.join("model.json");
    let temp_path = final_path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .with_context(|| format!("failed to create {}", temp_path.display()))?;
    file.write_all(&serde_json::to_vec_pretty(model)?)?;
    file.sync_all()?;
    fs::rename(&temp_path, &final_path)
        .with_context(|| format!("failed to move model into {}", final_path.display()))?;
    Ok(())
}

fn next_version(model_root: &Path) -> Result<u32> {
    let mut highest = 0u32;
    for entry in fs::read_dir(model_root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(number) = name.strip_prefix("version-") {
            if let Ok(number) = number.parse::<u32>() {
                highest = highest.max(number);
            }
        }
    }
    Ok(highest + 1)
}

/// Derive a 32-hex-char run id from the experiment and current time.
fn generate_run_id(experiment_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(experiment_id.as_bytes());
    hasher.update(chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0).to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hex::encode(hasher.finalize())[..32].to_string()
}
