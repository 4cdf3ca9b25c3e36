//! Error types for redeploy-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ObjectKind;

/// Precondition violations detected before any cluster call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    /// A manifest document has no (or an empty) `metadata.name`.
    #[error("{0} manifest has no metadata.name")]
    MissingName(ObjectKind),

    /// Deployment and Service must share one name.
    #[error("deployment name '{deployment}' does not match service name '{service}'")]
    NameMismatch { deployment: String, service: String },
}

/// Errors loading manifest documents from disk.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error reading manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error; includes file path and line context from serde_yaml.
    #[error("failed to parse {kind} manifest at {path}: {source}")]
    Parse {
        kind: ObjectKind,
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Manifest passed in memory (no path) failed to parse.
    #[error("failed to parse {kind} manifest: {source}")]
    ParseStr {
        kind: ObjectKind,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors loading the optional `redeploy.yaml` config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub(crate) fn manifest_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn config_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
