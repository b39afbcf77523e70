//! Meshplane API types and CRDs for Kubernetes integration
//!
//! This library defines the custom resources used by the mesh control plane:
//! - Discovery: Mesh, Destination, Workload (written by the discovery layer)
//! - Networking: TrafficPolicy, AccessPolicy, VirtualMesh, FailoverService
//! - Settings: Settings and KubernetesCluster registration

pub mod discovery;
pub mod networking;
pub mod refs;
pub mod selectors;
pub mod settings;
pub mod status;

pub use discovery::{Destination, Mesh, Workload};
pub use networking::{AccessPolicy, FailoverService, TrafficPolicy, VirtualMesh};
pub use refs::ClusterObjectRef;
pub use settings::{KubernetesCluster, Settings};
pub use status::{AppliedPolicy, ApprovalState, ApprovalStatus, PolicyStatus};
