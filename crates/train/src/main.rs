//! Training pipeline for the house price model
//!
//! One-command pipeline: load the raw CSV, fit the regression, and log the
//! run to an mlruns-style file store where the serving side can resolve it.

mod dataset;
mod fit;
mod store;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// House price model trainer
#[derive(Parser)]
#[command(name = "price-train")]
#[command(author, version, about = "Train the house price model and log the run", long_about = None)]
struct Cli {
    /// Path to the raw housing CSV
    #[arg(long, default_value = "data/raw.csv")]
    data: PathBuf,

    /// Root of the mlruns file store to write into
    #[arg(long, env = "MODEL_MLRUNS_ROOT", default_value = "mlruns")]
    mlruns: PathBuf,

    /// Experiment id to log the run under
    #[arg(long, default_value = "0")]
    experiment_id: String,

    /// Register the fitted model under this name in the store registry
    #[arg(long)]
    register_as: Option<String>,

    /// Alias to assign to the registered version (e.g. production)
    #[arg(long, requires = "register_as")]
    alias: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let dataset = dataset::load_csv(&cli.data)?;
    let fitted = fit::fit_ols(&dataset)?;
    info!(
        rows = dataset.len(),
        r2_score = fitted.r2_score,
        "Model fitted"
    );

    let paths = store::log_run(&cli.mlruns, &cli.experiment_id, &fitted.model, fitted.r2_score)?;

    if let Some(name) = &cli.register_as {
        let version = store::register_model(
            &cli.mlruns,
            name,
            &paths.model_dir,
            cli.alias.as_deref(),
        )?;
        info!(model = %name, version = version, "Registered fitted model");
    }

    info!(run_id = %paths.run_id, "Training completed");
    Ok(())
}
