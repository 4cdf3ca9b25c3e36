//! The CRUD seam between the reconciler and a cluster.

use async_trait::async_trait;

use redeploy_core::{Namespace, ObjectKind, ObjectRef, WorkloadObject};

use crate::error::TransportError;

/// CRUD primitives over one (kind, namespace) collection at a time.
///
/// Authentication and connection setup happen before a transport is handed to
/// the reconciler.
#[async_trait]
pub trait ClusterTransport: Send + Sync {
    /// All objects of `kind` in `namespace`. An empty collection is `Ok(vec![])`.
    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &Namespace,
    ) -> Result<Vec<WorkloadObject>, TransportError>;

    /// A single object, or `None` when absent.
    async fn get(&self, target: &ObjectRef) -> Result<Option<WorkloadObject>, TransportError>;

    /// Delete `target`, returning once it is gone. Absence is reported as
    /// [`TransportError::NotFound`].
    async fn delete(&self, target: &ObjectRef) -> Result<(), TransportError>;

    /// Create `object` in `namespace`. A name collision is reported as
    /// [`TransportError::AlreadyExists`].
    async fn create(
        &self,
        namespace: &Namespace,
        object: &WorkloadObject,
    ) -> Result<WorkloadObject, TransportError>;
}
