//! Optional `redeploy.yaml` configuration.
//!
//! ```yaml
//! namespace: default
//! deployment: manifests/nginx_deployment.yml
//! service: manifests/nginx_service.yml
//! timeout_secs: 60
//! ```
//!
//! Every field is optional. Relative manifest paths are resolved against the
//! directory holding the config file, so a checked-in config works from any
//! working directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{config_io_err, ConfigError};
use crate::types::Namespace;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "redeploy.yaml";

pub const DEFAULT_DEPLOYMENT_MANIFEST: &str = "manifests/nginx_deployment.yml";
pub const DEFAULT_SERVICE_MANIFEST: &str = "manifests/nginx_service.yml";

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub namespace: Namespace,
    pub deployment: PathBuf,
    pub service: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: Namespace::default(),
            deployment: PathBuf::from(DEFAULT_DEPLOYMENT_MANIFEST),
            service: PathBuf::from(DEFAULT_SERVICE_MANIFEST),
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Overall deadline for one reconcile run, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Load a config file.
///
/// Returns `ConfigError::Io` if unreadable and `ConfigError::Parse` (with path
/// + line context) if malformed.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| config_io_err(path, source))?;
    let mut config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(base) = path.parent() {
        config.deployment = resolve(base, &config.deployment);
        config.service = resolve(base, &config.service);
    }
    Ok(config)
}

/// Load `path` if given, else `<dir>/redeploy.yaml` if it exists, else defaults.
///
/// An explicitly named file that does not exist is an error; the implicit one
/// is not.
pub fn discover_at(dir: &Path, path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_at(path),
        None => {
            let implicit = dir.join(CONFIG_FILE_NAME);
            if implicit.exists() {
                load_at(&implicit)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
