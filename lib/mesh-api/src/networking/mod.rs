/// Operator-authored policy resources

pub mod access_policy;
pub mod failover_service;
pub mod traffic_policy;
pub mod virtual_mesh;

pub use access_policy::{AccessPolicy, AccessPolicySpec};
pub use failover_service::{FailoverService, FailoverServiceSpec};
pub use traffic_policy::{TrafficPolicy, TrafficPolicySpec};
pub use virtual_mesh::{VirtualMesh, VirtualMeshSpec};

use crate::AppliedPolicy;

pub type AppliedTrafficPolicy = AppliedPolicy<TrafficPolicySpec>;
pub type AppliedAccessPolicy = AppliedPolicy<AccessPolicySpec>;
pub type AppliedVirtualMesh = AppliedPolicy<VirtualMeshSpec>;
pub type AppliedFailoverService = AppliedPolicy<FailoverServiceSpec>;
