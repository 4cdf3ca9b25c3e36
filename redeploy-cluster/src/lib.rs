//! Cluster transport layer: the CRUD trait the reconciler drives, a `kube`
//! implementation for real clusters and an in-memory one.

mod error;
pub mod kube_transport;
pub mod memory;
pub mod transport;

pub use error::TransportError;
pub use kube_transport::KubeTransport;
pub use memory::{Call, Fault, MemoryTransport, Operation};
pub use transport::ClusterTransport;
