//! [`ClusterTransport`] backed by a live API server through `kube`.

use std::fmt::Debug;
use std::future::Future;

use async_trait::async_trait;
use either::Either;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::runtime::wait::{await_condition, conditions};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;

use redeploy_core::{Namespace, ObjectKind, ObjectRef, WorkloadObject};

use crate::error::{kube_err, TransportError};
use crate::transport::ClusterTransport;

/// Talks to the cluster named by the local kubeconfig (or the in-cluster
/// service account).
#[derive(Clone)]
pub struct KubeTransport {
    client: Client,
}

impl KubeTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from `KUBECONFIG` / `~/.kube/config` or the in-cluster
    /// environment.
    pub async fn try_default() -> Result<Self, TransportError> {
        let client = Client::try_default()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self::new(client))
    }

    fn deployments(&self, namespace: &Namespace) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace.as_str())
    }

    fn services(&self, namespace: &Namespace) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace.as_str())
    }
}

#[async_trait]
impl ClusterTransport for KubeTransport {
    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &Namespace,
    ) -> Result<Vec<WorkloadObject>, TransportError> {
        let collection = ObjectRef::new(kind, namespace, "");
        let params = ListParams::default();
        let objects = match kind {
            ObjectKind::Deployment => self
                .deployments(namespace)
                .list(&params)
                .await
                .map_err(|e| kube_err(&collection, e))?
                .items
                .into_iter()
                .map(WorkloadObject::Deployment)
                .collect(),
            ObjectKind::Service => self
                .services(namespace)
                .list(&params)
                .await
                .map_err(|e| kube_err(&collection, e))?
                .items
                .into_iter()
                .map(WorkloadObject::Service)
                .collect(),
        };
        Ok(objects)
    }

    async fn get(&self, target: &ObjectRef) -> Result<Option<WorkloadObject>, TransportError> {
        let object = match target.kind {
            ObjectKind::Deployment => self
                .deployments(&target.namespace)
                .get_opt(&target.name)
                .await
                .map_err(|e| kube_err(target, e))?
                .map(WorkloadObject::Deployment),
            ObjectKind::Service => self
                .services(&target.namespace)
                .get_opt(&target.name)
                .await
                .map_err(|e| kube_err(target, e))?
                .map(WorkloadObject::Service),
        };
        Ok(object)
    }

    async fn delete(&self, target: &ObjectRef) -> Result<(), TransportError> {
        match target.kind {
            ObjectKind::Deployment => {
                delete_and_wait(self.deployments(&target.namespace), target).await
            }
            ObjectKind::Service => delete_and_wait(self.services(&target.namespace), target).await,
        }
    }

    async fn create(
        &self,
        namespace: &Namespace,
        object: &WorkloadObject,
    ) -> Result<WorkloadObject, TransportError> {
        let target = object.object_ref(namespace);
        let params = PostParams::default();
        let created = match object.in_namespace(namespace) {
            WorkloadObject::Deployment(body) => self
                .deployments(namespace)
                .create(&params, &body)
                .await
                .map(WorkloadObject::Deployment),
            WorkloadObject::Service(body) => self
                .services(namespace)
                .create(&params, &body)
                .await
                .map(WorkloadObject::Service),
        };
        created.map_err(|e| kube_err(&target, e))
    }
}

/// Delete `target` and return only once it is gone from the API server.
///
/// A delete held back by finalizers (load-balancer cleanup, foreground GC)
/// answers with the still-present object; a create issued then would collide.
async fn delete_and_wait<K>(api: Api<K>, target: &ObjectRef) -> Result<(), TransportError>
where
    K: Resource + Clone + Debug + DeserializeOwned + Send + 'static,
{
    let response = api
        .delete(&target.name, &DeleteParams::default())
        .await
        .map_err(|e| kube_err(target, e))?;
    settle_delete(target, response, |uid| async move {
        await_condition(api, &target.name, conditions::is_deleted(&uid))
            .await
            .map(|_| ())
            .map_err(|e| TransportError::Connection(e.to_string()))
    })
    .await
}

async fn settle_delete<K, S, W, Fut>(
    target: &ObjectRef,
    response: Either<K, S>,
    wait_gone: W,
) -> Result<(), TransportError>
where
    K: Resource,
    W: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<(), TransportError>>,
{
    match response {
        Either::Left(pending) => {
            let uid = pending.uid().unwrap_or_default();
            tracing::debug!(object = %target, %uid, "delete pending; waiting for removal");
            wait_gone(uid).await?;
            tracing::debug!(object = %target, "removed");
        }
        Either::Right(_) => tracing::debug!(object = %target, "delete accepted"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;

    fn target() -> ObjectRef {
        ObjectRef::service(&Namespace::from("default"), "nginx")
    }

    fn lingering_service() -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("nginx".into()),
                uid: Some("3f9c".into()),
                finalizers: Some(vec!["service.kubernetes.io/load-balancer-cleanup".into()]),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn pending_delete_waits_for_the_object_uid() {
        let mut waited = None;
        let result = settle_delete(&target(), Either::<_, ()>::Left(lingering_service()), |uid| {
            waited = Some(uid);
            async { Ok(()) }
        })
        .await;

        assert_eq!(result, Ok(()));
        assert_eq!(waited.as_deref(), Some("3f9c"));
    }

    #[tokio::test]
    async fn finished_delete_does_not_wait() {
        let mut waited = false;
        let result = settle_delete(&target(), Either::<Service, ()>::Right(()), |_| {
            waited = true;
            async { Ok(()) }
        })
        .await;

        assert_eq!(result, Ok(()));
        assert!(!waited);
    }

    #[tokio::test]
    async fn failed_wait_is_reported() {
        let result = settle_delete(&target(), Either::<_, ()>::Left(lingering_service()), |_| async {
            Err(TransportError::Connection("watch closed".into()))
        })
        .await;
        assert_eq!(
            result,
            Err(TransportError::Connection("watch closed".into()))
        );
    }
}
