//! # redeploy-engine
//!
//! Idempotent reconcile cycle for one Deployment + Service pair.
//!
//! Call [`reconcile`] (or [`reconcile_with_deadline`]) with any
//! [`ClusterTransport`](redeploy_cluster::ClusterTransport); the result is
//! always a [`ReconcileOutcome`], never an `Err`.

pub mod outcome;
pub mod pipeline;
pub mod reconciler;

pub use outcome::{FailureCause, ListFailure, Listing, ReconcileOutcome, Stage};
pub use pipeline::RunPlan;
pub use reconciler::{reconcile, reconcile_with_deadline};
