//! `redeploy status`: is the workload's deployment and service present?

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use redeploy_cluster::{ClusterTransport, KubeTransport};
use redeploy_core::{load_manifest_at, ObjectRef};

use super::TargetArgs;

/// Arguments for `redeploy status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ObjectStatus {
    object: ObjectRef,
    present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource_version: Option<String>,
}

impl StatusArgs {
    pub async fn run(self) -> Result<()> {
        let config = self.target.resolve()?;
        let manifest = load_manifest_at(&config.deployment, &config.service)
            .context("failed to load manifests")?;
        config.namespace.validate()?;
        let workload = manifest.workload_name()?;

        let transport = KubeTransport::try_default()
            .await
            .context("failed to connect to cluster")?;
        let targets = [
            ObjectRef::deployment(&config.namespace, workload.as_str()),
            ObjectRef::service(&config.namespace, workload.as_str()),
        ];
        let statuses = collect(&transport, targets).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&statuses)?);
            return Ok(());
        }
        for status in statuses {
            let mark = if status.present {
                "■".green().bold()
            } else {
                "■".red().bold()
            };
            let detail = match &status.resource_version {
                Some(version) => format!("present (resourceVersion {version})"),
                None if status.present => "present".to_string(),
                None => "absent".to_string(),
            };
            println!("{mark} {:<40} {detail}", status.object.to_string());
        }
        Ok(())
    }
}

async fn collect<T>(transport: &T, targets: [ObjectRef; 2]) -> Result<Vec<ObjectStatus>>
where
    T: ClusterTransport + ?Sized,
{
    let mut statuses = Vec::with_capacity(targets.len());
    for object in targets {
        let found = transport
            .get(&object)
            .await
            .with_context(|| format!("failed to get {object}"))?;
        statuses.push(ObjectStatus {
            present: found.is_some(),
            resource_version: found
                .as_ref()
                .and_then(|o| o.resource_version())
                .map(str::to_owned),
            object,
        });
    }
    Ok(statuses)
}
