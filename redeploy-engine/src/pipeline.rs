//! Shared reconcile entrypoint used by the CLI.

use std::time::Duration;

use redeploy_cluster::ClusterTransport;
use redeploy_core::{load_manifest_at, Config, ManifestError, Namespace, WorkloadManifest};

use crate::outcome::ReconcileOutcome;
use crate::reconciler::{reconcile, reconcile_with_deadline};

/// Everything one invocation needs, resolved before any cluster call.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub namespace: Namespace,
    pub manifest: WorkloadManifest,
    pub timeout: Option<Duration>,
}

impl RunPlan {
    /// Load the manifest pair named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ManifestError> {
        Ok(Self {
            namespace: config.namespace.clone(),
            manifest: load_manifest_at(&config.deployment, &config.service)?,
            timeout: config.timeout(),
        })
    }
}

/// Run one cycle for `plan`, bounded by its timeout when set.
pub async fn run<T>(transport: &T, plan: &RunPlan) -> ReconcileOutcome
where
    T: ClusterTransport + ?Sized,
{
    match plan.timeout {
        Some(timeout) => {
            reconcile_with_deadline(transport, &plan.namespace, &plan.manifest, timeout).await
        }
        None => reconcile(transport, &plan.namespace, &plan.manifest).await,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use redeploy_cluster::MemoryTransport;

    use super::*;

    fn bundled_config() -> Config {
        let manifests = Path::new(env!("CARGO_MANIFEST_DIR")).join("../manifests");
        Config {
            deployment: manifests.join("nginx_deployment.yml"),
            service: manifests.join("nginx_service.yml"),
            ..Config::default()
        }
    }

    #[test]
    fn plan_from_config_loads_manifests() {
        let plan = RunPlan::from_config(&bundled_config()).expect("plan");
        assert_eq!(plan.namespace, Namespace::from("default"));
        assert_eq!(plan.timeout, None);
        assert_eq!(
            plan.manifest.service.metadata.name.as_deref(),
            Some("nginx")
        );
    }

    #[test]
    fn plan_from_config_reports_missing_manifest() {
        let config = Config {
            deployment: "does/not/exist.yml".into(),
            ..bundled_config()
        };
        let err = RunPlan::from_config(&config).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn run_with_timeout_succeeds_on_fast_cluster() {
        let mut plan = RunPlan::from_config(&bundled_config()).expect("plan");
        plan.timeout = Some(Duration::from_secs(30));
        let cluster = MemoryTransport::new();
        let outcome = run(&cluster, &plan).await;
        assert!(outcome.is_verified(), "got: {outcome:?}");
    }
}
