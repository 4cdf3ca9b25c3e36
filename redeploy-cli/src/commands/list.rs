//! `redeploy list`: show deployments and services in a namespace.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use redeploy_cluster::{ClusterTransport, KubeTransport};
use redeploy_core::{config, Namespace, ObjectKind};

/// Arguments for `redeploy list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Namespace to list (default: config file, then `default`).
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct ObjectRow {
    #[tabled(rename = "kind")]
    kind: ObjectKind,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "version")]
    version: String,
}

impl ListArgs {
    pub async fn run(self) -> Result<()> {
        let namespace = match self.namespace {
            Some(ns) => Namespace::from(ns),
            None => {
                let cwd = std::env::current_dir().context("could not determine working directory")?;
                config::discover_at(&cwd, None)
                    .context("failed to load config")?
                    .namespace
            }
        };
        namespace.validate()?;

        let transport = KubeTransport::try_default()
            .await
            .context("failed to connect to cluster")?;
        let rows = list_rows(&transport, &namespace).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        if rows.is_empty() {
            println!("No deployments or services in namespace '{namespace}'.");
            return Ok(());
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

async fn list_rows<T>(transport: &T, namespace: &Namespace) -> Result<Vec<ObjectRow>>
where
    T: ClusterTransport + ?Sized,
{
    let mut rows = Vec::new();
    for kind in ObjectKind::all() {
        let objects = transport
            .list(kind, namespace)
            .await
            .with_context(|| format!("failed to list {kind}s in '{namespace}'"))?;
        rows.extend(objects.into_iter().map(|object| ObjectRow {
            kind,
            name: object.name().unwrap_or_default().to_owned(),
            version: object.resource_version().unwrap_or("-").to_owned(),
        }));
    }
    Ok(rows)
}
