//! Manifest and config loading against real files.

use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use redeploy_core::{
    config::{self, Config},
    load_manifest_at, ConfigError, ManifestError, Namespace, ObjectKind, ValidationError,
    WorkloadName,
};
use rstest::rstest;

const DEPLOYMENT: &str = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: nginx\n";
const SERVICE: &str = "apiVersion: v1\nkind: Service\nmetadata:\n  name: nginx\n";

fn repo_manifest(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("manifests")
        .join(name)
}

// ---------------------------------------------------------------------------
// 1. Manifests
// ---------------------------------------------------------------------------

#[test]
fn bundled_nginx_manifests_load_and_validate() {
    let manifest = load_manifest_at(
        &repo_manifest("nginx_deployment.yml"),
        &repo_manifest("nginx_service.yml"),
    )
    .expect("load bundled manifests");
    assert_eq!(manifest.workload_name(), Ok(WorkloadName::from("nginx")));
}

#[test]
fn missing_manifest_returns_io_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let service = dir.child("svc.yml");
    service.write_str(SERVICE).expect("write");

    let err = load_manifest_at(&dir.path().join("absent.yml"), service.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("absent.yml"));
}

#[test]
fn corrupt_manifest_returns_parse_error_with_kind_and_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let deployment = dir.child("dep.yml");
    let service = dir.child("svc.yml");
    deployment.write_str(DEPLOYMENT).expect("write");
    service
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = load_manifest_at(deployment.path(), service.path()).unwrap_err();
    assert!(
        matches!(
            err,
            ManifestError::Parse {
                kind: ObjectKind::Service,
                ..
            }
        ),
        "got: {err}"
    );
    assert!(err.to_string().contains("svc.yml"));
}

#[test]
fn mismatched_names_load_but_fail_validation() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let deployment = dir.child("dep.yml");
    let service = dir.child("svc.yml");
    deployment
        .write_str("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: a\n")
        .expect("write");
    service
        .write_str("apiVersion: v1\nkind: Service\nmetadata:\n  name: b\n")
        .expect("write");

    let manifest = load_manifest_at(deployment.path(), service.path()).expect("load");
    assert_eq!(
        manifest.workload_name(),
        Err(ValidationError::NameMismatch {
            deployment: "a".into(),
            service: "b".into()
        })
    );
}

// ---------------------------------------------------------------------------
// 2. Config
// ---------------------------------------------------------------------------

#[test]
fn discover_without_file_uses_defaults() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let config = config::discover_at(dir.path(), None).expect("discover");
    assert_eq!(config, Config::default());
}

#[test]
fn discover_finds_implicit_file_and_resolves_paths() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("redeploy.yaml")
        .write_str("namespace: staging\ndeployment: k8s/dep.yml\n")
        .expect("write");

    let config = config::discover_at(dir.path(), None).expect("discover");
    assert_eq!(config.namespace, Namespace::from("staging"));
    assert_eq!(config.deployment, dir.path().join("k8s").join("dep.yml"));
    assert_eq!(
        config.service,
        dir.path().join(config::DEFAULT_SERVICE_MANIFEST)
    );
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("nope.yaml");
    let err = config::discover_at(dir.path(), Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
}

#[rstest]
#[case::not_a_mapping("- a list\n")]
#[case::wrong_type("timeout_secs: soon\n")]
#[case::unknown_field("replicas: 3\n")]
fn malformed_config_returns_parse_error(#[case] body: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("redeploy.yaml");
    file.write_str(body).expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("redeploy.yaml"));
}
