//! The reconcile cycle: validate, list, delete-if-present, create, list.
//!
//! ## Ordering
//!
//! Each stage is a future awaited to completion before the next one is built.
//! List and delete issue their deployment and service calls together and wait
//! for both; create runs deployment then service so that a failed deployment
//! create never leaves a lone service behind.
//!
//! ## Failures
//!
//! - list-before / list-after never fail the run; failed list calls are
//!   recorded in the [`Listing`].
//! - delete absorbs not-found; anything else stops the cycle.
//! - create reports already-exists as [`FailureCause::Conflict`].
//! - nothing is retried or rolled back. A failed create after a successful
//!   delete leaves the workload absent until the next invocation.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;

use redeploy_cluster::{ClusterTransport, TransportError};
use redeploy_core::{
    Namespace, ObjectKind, ObjectRef, ValidationError, WorkloadManifest, WorkloadName,
};

use crate::outcome::{FailureCause, ListFailure, Listing, ReconcileOutcome, Stage};

/// Run one cycle with no deadline.
pub async fn reconcile<T>(
    transport: &T,
    namespace: &Namespace,
    manifest: &WorkloadManifest,
) -> ReconcileOutcome
where
    T: ClusterTransport + ?Sized,
{
    run(transport, namespace, manifest, None).await
}

/// Run one cycle that must finish within `timeout`.
///
/// On expiry the in-flight stage is abandoned and the outcome is
/// `Failed { stage, cause: Timeout }`. Calls already accepted by the cluster
/// stay applied. A `timeout` too large to express as an instant runs the
/// cycle unbounded.
pub async fn reconcile_with_deadline<T>(
    transport: &T,
    namespace: &Namespace,
    manifest: &WorkloadManifest,
    timeout: Duration,
) -> ReconcileOutcome
where
    T: ClusterTransport + ?Sized,
{
    let deadline = Instant::now().checked_add(timeout).map(|at| Deadline {
        at,
        budget: timeout,
    });
    if deadline.is_none() {
        tracing::warn!(?timeout, "timeout out of range; running without a deadline");
    }
    run(transport, namespace, manifest, deadline).await
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    budget: Duration,
}

/// A fatal stage result; converted into `ReconcileOutcome::Failed`.
struct Abort {
    stage: Stage,
    cause: FailureCause,
}

async fn run<T>(
    transport: &T,
    namespace: &Namespace,
    manifest: &WorkloadManifest,
    deadline: Option<Deadline>,
) -> ReconcileOutcome
where
    T: ClusterTransport + ?Sized,
{
    let workload = match validate(namespace, manifest) {
        Ok(workload) => workload,
        Err(err) => {
            tracing::error!(error = %err, "manifest rejected before any cluster call");
            return ReconcileOutcome::Failed {
                stage: Stage::Validate,
                cause: FailureCause::Validation(err),
            };
        }
    };

    let span = tracing::info_span!("reconcile", namespace = %namespace, workload = %workload);
    let result = cycle(transport, namespace, manifest, workload, deadline)
        .instrument(span)
        .await;
    match result {
        Ok(outcome) => outcome,
        Err(Abort { stage, cause }) => ReconcileOutcome::Failed { stage, cause },
    }
}

fn validate(
    namespace: &Namespace,
    manifest: &WorkloadManifest,
) -> Result<WorkloadName, ValidationError> {
    namespace.validate()?;
    manifest.workload_name()
}

async fn cycle<T>(
    transport: &T,
    namespace: &Namespace,
    manifest: &WorkloadManifest,
    workload: WorkloadName,
    deadline: Option<Deadline>,
) -> Result<ReconcileOutcome, Abort>
where
    T: ClusterTransport + ?Sized,
{
    tracing::info!("listing existing objects");
    let before = bounded(deadline, Stage::ListBefore, list_stage(transport, namespace)).await?;

    tracing::info!("deleting existing objects");
    bounded(
        deadline,
        Stage::Delete,
        delete_stage(transport, namespace, &workload),
    )
    .await??;

    tracing::info!("creating objects from manifest");
    bounded(
        deadline,
        Stage::Create,
        create_stage(transport, namespace, manifest),
    )
    .await??;

    tracing::info!("listing objects after create");
    let after = bounded(deadline, Stage::ListAfter, list_stage(transport, namespace)).await?;
    if !after.is_complete() {
        tracing::warn!(
            failed_kinds = after.failures.len(),
            "final listing incomplete; result is unverified"
        );
    }

    tracing::info!(listed = after.objects.len(), "reconcile finished");
    Ok(ReconcileOutcome::Succeeded {
        workload,
        before,
        after,
    })
}

/// Await `stage_future`, abandoning it when the deadline passes.
async fn bounded<F>(
    deadline: Option<Deadline>,
    stage: Stage,
    stage_future: F,
) -> Result<F::Output, Abort>
where
    F: Future,
{
    let Some(deadline) = deadline else {
        return Ok(stage_future.await);
    };
    tokio::time::timeout_at(deadline.at, stage_future)
        .await
        .map_err(|_| {
            tracing::error!(%stage, budget = ?deadline.budget, "deadline exceeded; stage abandoned");
            Abort {
                stage,
                cause: FailureCause::Timeout {
                    after: deadline.budget,
                },
            }
        })
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

async fn list_stage<T>(transport: &T, namespace: &Namespace) -> Listing
where
    T: ClusterTransport + ?Sized,
{
    let (deployments, services) = tokio::join!(
        transport.list(ObjectKind::Deployment, namespace),
        transport.list(ObjectKind::Service, namespace),
    );

    let mut listing = Listing::default();
    for (kind, result) in [
        (ObjectKind::Deployment, deployments),
        (ObjectKind::Service, services),
    ] {
        match result {
            Ok(objects) => {
                tracing::info!(%kind, count = objects.len(), "listed");
                for object in objects {
                    let object_ref = object.object_ref(namespace);
                    tracing::debug!(object = %object_ref, version = ?object.resource_version(), "found");
                    listing.objects.push(object_ref);
                }
            }
            Err(error) => {
                tracing::warn!(%kind, %error, "list failed");
                listing.failures.push(ListFailure { kind, error });
            }
        }
    }
    listing
}

async fn delete_stage<T>(
    transport: &T,
    namespace: &Namespace,
    workload: &WorkloadName,
) -> Result<(), Abort>
where
    T: ClusterTransport + ?Sized,
{
    let deployment = ObjectRef::deployment(namespace, workload.as_str());
    let service = ObjectRef::service(namespace, workload.as_str());
    let (deployment_result, service_result) =
        tokio::join!(transport.delete(&deployment), transport.delete(&service));

    // Deployment is checked first so its error wins when both fail.
    for (target, result) in [(deployment, deployment_result), (service, service_result)] {
        match result {
            Ok(()) => tracing::info!(object = %target, "deleted"),
            Err(TransportError::NotFound { .. }) => {
                tracing::debug!(object = %target, "already absent")
            }
            Err(source) => {
                tracing::error!(object = %target, error = %source, "delete failed");
                return Err(Abort {
                    stage: Stage::Delete,
                    cause: FailureCause::Transport { target, source },
                });
            }
        }
    }
    Ok(())
}

async fn create_stage<T>(
    transport: &T,
    namespace: &Namespace,
    manifest: &WorkloadManifest,
) -> Result<(), Abort>
where
    T: ClusterTransport + ?Sized,
{
    for object in manifest.objects() {
        let target = object.object_ref(namespace);
        if let Some(declared) = object.namespace().filter(|d| *d != namespace.as_str()) {
            tracing::warn!(object = %target, declared, "manifest namespace overridden");
        }

        match transport.create(namespace, &object).await {
            Ok(created) => {
                tracing::info!(object = %target, version = ?created.resource_version(), "created")
            }
            Err(TransportError::AlreadyExists { .. }) => {
                tracing::error!(object = %target, "object reappeared before create");
                return Err(Abort {
                    stage: Stage::Create,
                    cause: FailureCause::Conflict { target },
                });
            }
            Err(source) => {
                tracing::error!(object = %target, error = %source, "create failed");
                return Err(Abort {
                    stage: Stage::Create,
                    cause: FailureCause::Transport { target, source },
                });
            }
        }
    }
    Ok(())
}
