//! `redeploy reconcile`: delete and recreate the workload from its manifests.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::{json, Value};

use redeploy_cluster::KubeTransport;
use redeploy_core::{Namespace, ObjectRef};
use redeploy_engine::{pipeline, FailureCause, Listing, ReconcileOutcome, RunPlan, Stage};

use super::TargetArgs;

/// Arguments for `redeploy reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Abandon the run after this many seconds (overrides `timeout_secs`).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReconcileArgs {
    pub async fn run(self) -> Result<()> {
        let mut config = self.target.resolve()?;
        if let Some(secs) = self.timeout {
            config.timeout_secs = Some(secs);
        }
        let plan = RunPlan::from_config(&config).context("failed to load manifests")?;
        tracing::info!(
            namespace = %plan.namespace,
            deployment = %config.deployment.display(),
            service = %config.service.display(),
            timeout = ?plan.timeout,
            "manifests loaded"
        );

        // Reject bad input before a client is even built.
        let precheck = plan
            .namespace
            .validate()
            .and_then(|()| plan.manifest.workload_name());
        let outcome = match precheck {
            Err(err) => ReconcileOutcome::Failed {
                stage: Stage::Validate,
                cause: FailureCause::Validation(err),
            },
            Ok(_) => {
                let transport = KubeTransport::try_default()
                    .await
                    .context("failed to connect to cluster")?;
                pipeline::run(&transport, &plan).await
            }
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome_json(&plan.namespace, &outcome))?
            );
        } else {
            print_outcome(&plan.namespace, &outcome);
        }

        if let Some(label) = outcome.failure_label() {
            bail!("reconcile failed ({label})");
        }
        Ok(())
    }
}

fn print_outcome(namespace: &Namespace, outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Succeeded {
            workload,
            before,
            after,
        } => {
            let mark = if after.is_complete() {
                "✓".green().bold()
            } else {
                "✓".yellow().bold()
            };
            println!("{mark} '{workload}' reconciled in namespace '{namespace}'");
            print_listing("before", before);
            print_listing("after", after);
            if !after.is_complete() {
                println!(
                    "  {}",
                    "final listing incomplete; verify the cluster manually".yellow()
                );
            }
            println!("Deploy finished. Check your cluster.");
        }
        ReconcileOutcome::Failed { stage, cause } => {
            println!(
                "{} reconcile failed at stage '{stage}': {cause}",
                "✗".red().bold()
            );
            if *stage == Stage::Create {
                println!(
                    "  {}",
                    "the workload may now be absent; re-run once the cause is fixed".yellow()
                );
            }
        }
    }
}

fn print_listing(label: &str, listing: &Listing) {
    let names: Vec<String> = listing.objects.iter().map(ObjectRef::to_string).collect();
    let shown = if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    };
    println!("  {label:<7}{shown}");
    for failure in &listing.failures {
        println!("  {:<7}{} list failed: {}", "", failure.kind, failure.error);
    }
}

fn listing_json(listing: &Listing) -> Value {
    json!({
        "objects": listing.objects,
        "failures": listing
            .failures
            .iter()
            .map(|f| json!({ "kind": f.kind, "error": f.error.to_string() }))
            .collect::<Vec<_>>(),
    })
}

fn outcome_json(namespace: &Namespace, outcome: &ReconcileOutcome) -> Value {
    match outcome {
        ReconcileOutcome::Succeeded {
            workload,
            before,
            after,
        } => json!({
            "status": "succeeded",
            "namespace": namespace,
            "workload": workload,
            "verified": outcome.is_verified(),
            "before": listing_json(before),
            "after": listing_json(after),
        }),
        ReconcileOutcome::Failed { stage, cause } => json!({
            "status": "failed",
            "namespace": namespace,
            "stage": stage.to_string(),
            "label": outcome.failure_label(),
            "error": cause.to_string(),
        }),
    }
}
