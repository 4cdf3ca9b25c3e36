//! Domain types for a single reconciled workload.
//!
//! A workload is one Deployment plus one Service sharing a `metadata.name`.
//! Live objects use the typed `k8s-openapi` structs so that manifests and
//! cluster responses share one representation.

use std::fmt;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed cluster namespace.
///
/// Construction does not validate; [`Namespace::validate`] is called by the
/// reconciler before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace(pub String);

impl Namespace {
    /// Namespace used when neither the config file nor the CLI names one.
    pub const DEFAULT: &'static str = "default";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject empty (or whitespace-only) namespaces.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0.trim().is_empty() {
            return Err(ValidationError::EmptyNamespace);
        }
        Ok(())
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The name shared by the Deployment and Service of one workload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadName(pub String);

impl WorkloadName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for WorkloadName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkloadName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The two object kinds a workload is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Deployment,
    Service,
}

impl ObjectKind {
    /// Both kinds, in the order every stage visits them.
    pub fn all() -> [ObjectKind; 2] {
        [ObjectKind::Deployment, ObjectKind::Service]
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Deployment => write!(f, "deployment"),
            ObjectKind::Service => write!(f, "service"),
        }
    }
}

// ---------------------------------------------------------------------------
// Object references
// ---------------------------------------------------------------------------

/// Identifies a live or desired cluster object. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub namespace: Namespace,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, namespace: &Namespace, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.clone(),
            name: name.into(),
        }
    }

    pub fn deployment(namespace: &Namespace, name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Deployment, namespace, name)
    }

    pub fn service(namespace: &Namespace, name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Service, namespace, name)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// A Deployment or Service body, as sent to or returned by the cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkloadObject {
    Deployment(Deployment),
    Service(Service),
}

impl WorkloadObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            WorkloadObject::Deployment(_) => ObjectKind::Deployment,
            WorkloadObject::Service(_) => ObjectKind::Service,
        }
    }

    /// `metadata.name`, if set.
    pub fn name(&self) -> Option<&str> {
        match self {
            WorkloadObject::Deployment(d) => d.metadata.name.as_deref(),
            WorkloadObject::Service(s) => s.metadata.name.as_deref(),
        }
    }

    /// `metadata.namespace` as declared by the document, if any.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            WorkloadObject::Deployment(d) => d.metadata.namespace.as_deref(),
            WorkloadObject::Service(s) => s.metadata.namespace.as_deref(),
        }
    }

    /// Reference to this object inside `namespace`. An unnamed object maps to
    /// an empty name.
    pub fn object_ref(&self, namespace: &Namespace) -> ObjectRef {
        ObjectRef::new(self.kind(), namespace, self.name().unwrap_or_default())
    }

    /// Copy of this object with `metadata.namespace` forced to `namespace`.
    pub fn in_namespace(&self, namespace: &Namespace) -> Self {
        let mut object = self.clone();
        let meta = match &mut object {
            WorkloadObject::Deployment(d) => &mut d.metadata,
            WorkloadObject::Service(s) => &mut s.metadata,
        };
        meta.namespace = Some(namespace.0.clone());
        object
    }

    /// `metadata.resourceVersion`, if the cluster assigned one.
    pub fn resource_version(&self) -> Option<&str> {
        match self {
            WorkloadObject::Deployment(d) => d.metadata.resource_version.as_deref(),
            WorkloadObject::Service(s) => s.metadata.resource_version.as_deref(),
        }
    }
}

impl From<Deployment> for WorkloadObject {
    fn from(d: Deployment) -> Self {
        WorkloadObject::Deployment(d)
    }
}

impl From<Service> for WorkloadObject {
    fn from(s: Service) -> Self {
        WorkloadObject::Service(s)
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Desired state of one workload. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadManifest {
    pub deployment: Deployment,
    pub service: Service,
}

impl WorkloadManifest {
    /// The shared `metadata.name` of both documents.
    ///
    /// Fails when either name is missing or empty, or when they differ.
    pub fn workload_name(&self) -> Result<WorkloadName, ValidationError> {
        let deployment = non_empty_name(self.deployment.metadata.name.as_deref())
            .ok_or(ValidationError::MissingName(ObjectKind::Deployment))?;
        let service = non_empty_name(self.service.metadata.name.as_deref())
            .ok_or(ValidationError::MissingName(ObjectKind::Service))?;
        if deployment != service {
            return Err(ValidationError::NameMismatch {
                deployment: deployment.to_owned(),
                service: service.to_owned(),
            });
        }
        Ok(WorkloadName::from(deployment))
    }

    /// Both documents as objects, deployment first.
    pub fn objects(&self) -> [WorkloadObject; 2] {
        [
            WorkloadObject::Deployment(self.deployment.clone()),
            WorkloadObject::Service(self.service.clone()),
        ]
    }
}

fn non_empty_name(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
