//! Structured result of one reconcile cycle.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use redeploy_cluster::TransportError;
use redeploy_core::{ObjectKind, ObjectRef, ValidationError, WorkloadName};

/// The stages of a cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Validate,
    ListBefore,
    Delete,
    Create,
    ListAfter,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validate => write!(f, "validate"),
            Stage::ListBefore => write!(f, "list-before"),
            Stage::Delete => write!(f, "delete"),
            Stage::Create => write!(f, "create"),
            Stage::ListAfter => write!(f, "list-after"),
        }
    }
}

/// Why a cycle stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// Precondition violated; no cluster call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Any transport failure other than the absorbed not-found on delete.
    #[error("{target}: {source}")]
    Transport {
        target: ObjectRef,
        #[source]
        source: TransportError,
    },

    /// The object was still present at create time: another actor is
    /// recreating it, or a delete did not take effect.
    #[error("{target} already exists after delete; another actor may be managing it")]
    Conflict { target: ObjectRef },

    /// The run's deadline expired; the in-flight stage was abandoned.
    #[error("deadline of {after:?} exceeded")]
    Timeout { after: Duration },
}

/// A list call that failed during a list stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFailure {
    pub kind: ObjectKind,
    pub error: TransportError,
}

/// Objects observed by a list stage.
///
/// Deployments come first, then services, each in transport order. A failed
/// list call leaves its kind out of `objects` and is recorded in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub objects: Vec<ObjectRef>,
    pub failures: Vec<ListFailure>,
}

impl Listing {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = &ObjectRef> {
        self.objects.iter().filter(move |r| r.kind == kind)
    }
}

/// Outcome of one full cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Succeeded {
        workload: WorkloadName,
        before: Listing,
        after: Listing,
    },
    Failed {
        /// The stage that was running when the cycle stopped.
        stage: Stage,
        cause: FailureCause,
    },
}

impl ReconcileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReconcileOutcome::Succeeded { .. })
    }

    /// Succeeded and the final listing is complete.
    pub fn is_verified(&self) -> bool {
        match self {
            ReconcileOutcome::Succeeded { after, .. } => after.is_complete(),
            ReconcileOutcome::Failed { .. } => false,
        }
    }

    /// Short failure tag: the failed stage, or `timeout` when the deadline
    /// expired regardless of which stage was in flight.
    pub fn failure_label(&self) -> Option<String> {
        match self {
            ReconcileOutcome::Succeeded { .. } => None,
            ReconcileOutcome::Failed {
                cause: FailureCause::Timeout { .. },
                ..
            } => Some("timeout".to_owned()),
            ReconcileOutcome::Failed { stage, .. } => Some(stage.to_string()),
        }
    }
}
