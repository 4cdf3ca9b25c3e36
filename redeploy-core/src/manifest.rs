//! Manifest loading.
//!
//! A workload manifest is two YAML documents on disk, one per kind. They are
//! parsed straight into the typed `k8s-openapi` objects; name validation is
//! left to the reconciler so that a bad pair is reported as a stage failure.

use std::path::Path;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use serde::de::DeserializeOwned;

use crate::error::{manifest_io_err, ManifestError};
use crate::types::{ObjectKind, WorkloadManifest};

/// Load a manifest pair from two YAML files.
///
/// Returns `ManifestError::Io` if a file can't be read and
/// `ManifestError::Parse` (with path + line context) if it is malformed.
pub fn load_manifest_at(
    deployment_path: &Path,
    service_path: &Path,
) -> Result<WorkloadManifest, ManifestError> {
    Ok(WorkloadManifest {
        deployment: load_document(ObjectKind::Deployment, deployment_path)?,
        service: load_document(ObjectKind::Service, service_path)?,
    })
}

impl WorkloadManifest {
    /// Parse a manifest pair from in-memory YAML.
    pub fn from_yaml_strs(deployment: &str, service: &str) -> Result<Self, ManifestError> {
        let deployment: Deployment = serde_yaml::from_str(deployment).map_err(|source| {
            ManifestError::ParseStr {
                kind: ObjectKind::Deployment,
                source,
            }
        })?;
        let service: Service =
            serde_yaml::from_str(service).map_err(|source| ManifestError::ParseStr {
                kind: ObjectKind::Service,
                source,
            })?;
        Ok(Self {
            deployment,
            service,
        })
    }
}

fn load_document<T: DeserializeOwned>(kind: ObjectKind, path: &Path) -> Result<T, ManifestError> {
    let contents = std::fs::read_to_string(path).map_err(|source| manifest_io_err(path, source))?;
    serde_yaml::from_str(&contents).map_err(|source| ManifestError::Parse {
        kind,
        path: path.to_path_buf(),
        source,
    })
}
