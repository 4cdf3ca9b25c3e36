//! redeploy core library: domain types, manifest and config loading, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, object references and the workload manifest
//! - [`error`]: [`ValidationError`], [`ManifestError`], [`ConfigError`]
//! - [`manifest`]: YAML manifest loading
//! - [`config`]: optional `redeploy.yaml`

pub mod config;
pub mod error;
pub mod manifest;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, ManifestError, ValidationError};
pub use manifest::load_manifest_at;
pub use types::{Namespace, ObjectKind, ObjectRef, WorkloadManifest, WorkloadName, WorkloadObject};
