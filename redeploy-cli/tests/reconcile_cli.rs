//! CLI behaviour that needs no cluster: input is rejected before a client is built.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn redeploy_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("redeploy").expect("redeploy binary");
    cmd.current_dir(cwd)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "warn")
        // Point kube at nothing so an accidental connection attempt fails fast.
        .env("KUBECONFIG", cwd.join("no-kubeconfig"));
    cmd
}

fn write_manifests(dir: &Path, deployment: &str, service: &str) {
    fs::write(
        dir.join("dep.yml"),
        format!("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: {deployment}\n"),
    )
    .expect("write deployment");
    fs::write(
        dir.join("svc.yml"),
        format!("apiVersion: v1\nkind: Service\nmetadata:\n  name: {service}\n"),
    )
    .expect("write service");
}

#[test]
fn mismatched_names_fail_validation() {
    let dir = TempDir::new().expect("tempdir");
    write_manifests(dir.path(), "a", "b");

    redeploy_cmd(dir.path())
        .args(["reconcile", "--deployment", "dep.yml", "--service", "svc.yml"])
        .assert()
        .failure()
        .stdout(contains("reconcile failed at stage 'validate'"))
        .stdout(contains("deployment name 'a' does not match service name 'b'"))
        .stderr(contains("reconcile failed (validate)"));
}

#[test]
fn json_output_reports_validation_failure() {
    let dir = TempDir::new().expect("tempdir");
    write_manifests(dir.path(), "nginx", "nginx");

    let output = redeploy_cmd(dir.path())
        .args([
            "reconcile",
            "--deployment",
            "dep.yml",
            "--service",
            "svc.yml",
            "--namespace",
            "",
            "--json",
        ])
        .output()
        .expect("run redeploy");
    assert!(!output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(value["status"], "failed");
    assert_eq!(value["label"], "validate");
    assert_eq!(value["error"], "namespace must not be empty");
}

#[test]
fn config_file_supplies_namespace_and_manifests() {
    let dir = TempDir::new().expect("tempdir");
    let k8s = dir.path().join("k8s");
    fs::create_dir_all(&k8s).expect("mkdir");
    write_manifests(&k8s, "web", "api");
    fs::write(
        dir.path().join("redeploy.yaml"),
        "namespace: staging\ndeployment: k8s/dep.yml\nservice: k8s/svc.yml\n",
    )
    .expect("write config");

    redeploy_cmd(dir.path())
        .arg("reconcile")
        .assert()
        .failure()
        .stdout(contains("'web' does not match service name 'api'"));
}

#[test]
fn missing_manifest_is_reported_with_path() {
    let dir = TempDir::new().expect("tempdir");

    redeploy_cmd(dir.path())
        .args(["reconcile", "--deployment", "absent.yml", "--service", "svc.yml"])
        .assert()
        .failure()
        .stderr(contains("failed to load manifests"))
        .stderr(contains("absent.yml"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("redeploy.yaml"), "- not: a mapping\n").expect("write config");

    redeploy_cmd(dir.path())
        .arg("reconcile")
        .assert()
        .failure()
        .stderr(contains("failed to load config"));
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().expect("tempdir");
    redeploy_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("reconcile"))
        .stdout(contains("list"))
        .stdout(contains("status"));
}
