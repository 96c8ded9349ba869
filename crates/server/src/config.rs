//! Server configuration
//!
//! Read once from the environment at process start; changing any value
//! requires a restart.

use anyhow::Result;
use serde::Deserialize;
use serving_lib::ResolutionStrategy;
use std::path::PathBuf;

/// Server configuration, populated from `MODEL_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Explicit strategy selection: `uri`, `registry`, `latest-run`, `scan`.
    /// When unset, the strategy is derived from which settings are present.
    #[serde(default)]
    pub resolution_strategy: Option<String>,

    /// Explicit artifact identifier (path, `name@alias`, or `runs:/...`)
    #[serde(default)]
    pub uri: Option<String>,

    /// Registered model name
    #[serde(default)]
    pub name: Option<String>,

    /// Registered model alias
    #[serde(default)]
    pub alias: Option<String>,

    /// Root of the mlruns file store
    #[serde(default = "default_mlruns_root")]
    pub mlruns_root: String,

    /// Experiment id for latest-run resolution
    #[serde(default)]
    pub experiment_id: Option<String>,

    /// HTTP listen port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_mlruns_root() -> String {
    "mlruns".to_string()
}

fn default_api_port() -> u16 {
    8000
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MODEL").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Select the single active resolution strategy.
    ///
    /// With `resolution_strategy` set, the named strategy is used and its
    /// required settings must be present. Otherwise the strategy is derived
    /// in fixed precedence: explicit URI, registry alias, latest run,
    /// directory scan of the mlruns root.
    pub fn strategy(&self) -> Result<ResolutionStrategy> {
        if let Some(kind) = self.resolution_strategy.as_deref() {
            return match kind {
                "uri" => {
                    let uri = self
                        .uri
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("MODEL_URI required for strategy 'uri'"))?;
                    Ok(ResolutionStrategy::ExplicitUri { uri })
                }
                "registry" => {
                    let model_name = self.name.clone().ok_or_else(|| {
                        anyhow::anyhow!("MODEL_NAME required for strategy 'registry'")
                    })?;
                    let alias = self.alias.clone().ok_or_else(|| {
                        anyhow::anyhow!("MODEL_ALIAS required for strategy 'registry'")
                    })?;
                    Ok(ResolutionStrategy::RegistryAlias { model_name, alias })
                }
                "latest-run" => {
                    let experiment_id = self.experiment_id.clone().ok_or_else(|| {
                        anyhow::anyhow!("MODEL_EXPERIMENT_ID required for strategy 'latest-run'")
                    })?;
                    Ok(ResolutionStrategy::LatestRun { experiment_id })
                }
                "scan" => Ok(ResolutionStrategy::DirectoryScan {
                    root: PathBuf::from(&self.mlruns_root),
                }),
                other => anyhow::bail!("unknown resolution strategy {:?}", other),
            };
        }

        if let Some(uri) = &self.uri {
            return Ok(ResolutionStrategy::ExplicitUri { uri: uri.clone() });
        }
        if let (Some(name), Some(alias)) = (&self.name, &self.alias) {
            return Ok(ResolutionStrategy::RegistryAlias {
                model_name: name.clone(),
                alias: alias.clone(),
            });
        }
        if let Some(experiment_id) = &self.experiment_id {
            return Ok(ResolutionStrategy::LatestRun {
                experiment_id: experiment_id.clone(),
            });
        }
        Ok(ResolutionStrategy::DirectoryScan {
            root: PathBuf::from(&self.mlruns_root),
        })
    }
}
