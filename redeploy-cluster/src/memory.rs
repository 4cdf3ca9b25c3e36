//! In-process cluster.
//!
//! [`MemoryTransport`] keeps objects in a map keyed by [`ObjectRef`], records
//! every call in order, and can be told to fail (or silently ignore) a given
//! operation on a given kind. Calls may also be slowed down by a fixed latency,
//! which drives deadline handling under a paused tokio clock.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use redeploy_core::{Namespace, ObjectKind, ObjectRef, WorkloadObject};

use crate::error::TransportError;
use crate::transport::ClusterTransport;

/// The four transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Delete,
    Create,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List => write!(f, "list"),
            Operation::Get => write!(f, "get"),
            Operation::Delete => write!(f, "delete"),
            Operation::Create => write!(f, "create"),
        }
    }
}

/// One recorded transport call. `name` is `None` for `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub kind: ObjectKind,
    pub namespace: Namespace,
    pub name: Option<String>,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}/{}/{}", self.operation, self.kind, self.namespace, name),
            None => write!(f, "{} {}/{}", self.operation, self.kind, self.namespace),
        }
    }
}

/// Injected misbehaviour for one (operation, kind) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Return this error instead of touching state.
    Fail(TransportError),
    /// Report success without touching state.
    Ignore,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectRef, WorkloadObject>,
    calls: Vec<Call>,
    faults: HashMap<(Operation, ObjectKind), Fault>,
    next_version: u64,
}

impl State {
    fn stamp(&mut self, object: &WorkloadObject, namespace: &Namespace) -> WorkloadObject {
        self.next_version += 1;
        let version = self.next_version.to_string();
        let mut stored = object.in_namespace(namespace);
        let meta = match &mut stored {
            WorkloadObject::Deployment(d) => &mut d.metadata,
            WorkloadObject::Service(s) => &mut s.metadata,
        };
        meta.resource_version = Some(version);
        stored
    }
}

/// A fake cluster for tests and offline runs.
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
    latency: Option<Duration>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert `object` into `namespace` as if someone else had created it.
    /// Not recorded as a call.
    pub async fn seed(&self, namespace: &Namespace, object: WorkloadObject) {
        let mut state = self.state.lock().await;
        let stored = state.stamp(&object, namespace);
        state.objects.insert(object.object_ref(namespace), stored);
    }

    /// Inject `fault` for every future `operation` on `kind`.
    pub async fn inject(&self, operation: Operation, kind: ObjectKind, fault: Fault) {
        self.state
            .lock()
            .await
            .faults
            .insert((operation, kind), fault);
    }

    pub async fn fail_on(&self, operation: Operation, kind: ObjectKind, err: TransportError) {
        self.inject(operation, kind, Fault::Fail(err)).await;
    }

    pub async fn clear_faults(&self) {
        self.state.lock().await.faults.clear();
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// References of all stored objects, sorted.
    pub async fn object_refs(&self) -> Vec<ObjectRef> {
        self.state.lock().await.objects.keys().cloned().collect()
    }

    pub async fn contains(&self, target: &ObjectRef) -> bool {
        self.state.lock().await.objects.contains_key(target)
    }

    async fn enter(&self, call: Call) -> Option<Fault> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.lock().await;
        let fault = state.faults.get(&(call.operation, call.kind)).cloned();
        tracing::trace!(%call, injected = fault.is_some(), "memory transport call");
        state.calls.push(call);
        fault
    }
}

#[async_trait]
impl ClusterTransport for MemoryTransport {
    async fn list(
        &self,
        kind: ObjectKind,
        namespace: &Namespace,
    ) -> Result<Vec<WorkloadObject>, TransportError> {
        let call = Call {
            operation: Operation::List,
            kind,
            namespace: namespace.clone(),
            name: None,
        };
        if let Some(Fault::Fail(err)) = self.enter(call).await {
            return Err(err);
        }
        let state = self.state.lock().await;
        Ok(state
            .objects
            .iter()
            .filter(|(r, _)| r.kind == kind && &r.namespace == namespace)
            .map(|(_, o)| o.clone())
            .collect())
    }

    async fn get(&self, target: &ObjectRef) -> Result<Option<WorkloadObject>, TransportError> {
        let call = Call {
            operation: Operation::Get,
            kind: target.kind,
            namespace: target.namespace.clone(),
            name: Some(target.name.clone()),
        };
        if let Some(Fault::Fail(err)) = self.enter(call).await {
            return Err(err);
        }
        Ok(self.state.lock().await.objects.get(target).cloned())
    }

    async fn delete(&self, target: &ObjectRef) -> Result<(), TransportError> {
        let call = Call {
            operation: Operation::Delete,
            kind: target.kind,
            namespace: target.namespace.clone(),
            name: Some(target.name.clone()),
        };
        match self.enter(call).await {
            Some(Fault::Fail(err)) => return Err(err),
            Some(Fault::Ignore) => return Ok(()),
            None => {}
        }
        match self.state.lock().await.objects.remove(target) {
            Some(_) => Ok(()),
            None => Err(TransportError::NotFound {
                target: target.clone(),
            }),
        }
    }

    async fn create(
        &self,
        namespace: &Namespace,
        object: &WorkloadObject,
    ) -> Result<WorkloadObject, TransportError> {
        let target = object.object_ref(namespace);
        let call = Call {
            operation: Operation::Create,
            kind: target.kind,
            namespace: namespace.clone(),
            name: Some(target.name.clone()),
        };
        match self.enter(call).await {
            Some(Fault::Fail(err)) => return Err(err),
            Some(Fault::Ignore) => return Ok(object.in_namespace(namespace)),
            None => {}
        }
        let mut state = self.state.lock().await;
        if state.objects.contains_key(&target) {
            return Err(TransportError::AlreadyExists { target });
        }
        let stored = state.stamp(object, namespace);
        state.objects.insert(target, stored.clone());
        Ok(stored)
    }
}
