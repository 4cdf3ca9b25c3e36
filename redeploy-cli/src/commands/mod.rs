pub mod list;
pub mod reconcile;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use redeploy_core::{config, Config, Namespace};

/// Where the workload lives and which manifests describe it.
///
/// Flags override `redeploy.yaml`, which overrides the built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Config file (default: ./redeploy.yaml when present).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Namespace to operate in.
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Deployment manifest (YAML).
    #[arg(long, value_name = "FILE")]
    pub deployment: Option<PathBuf>,

    /// Service manifest (YAML).
    #[arg(long, value_name = "FILE")]
    pub service: Option<PathBuf>,
}

impl TargetArgs {
    pub fn resolve(&self) -> Result<Config> {
        let cwd = std::env::current_dir().context("could not determine working directory")?;
        let mut config = config::discover_at(&cwd, self.config.as_deref())
            .context("failed to load config")?;
        if let Some(namespace) = &self.namespace {
            config.namespace = Namespace::from(namespace.as_str());
        }
        if let Some(deployment) = &self.deployment {
            config.deployment = deployment.clone();
        }
        if let Some(service) = &self.service {
            config.service = service.clone();
        }
        Ok(config)
    }
}
