//! Deterministic acceptance order of policies competing for one target
//!
//! Candidates are ranked by their prior approval for the target:
//! 0. accepted and up to date
//! 1. accepted but stale
//! 2. previously seen for the target but not accepted
//! 3. never seen for the target
//!
//! Ranks 0 and 1 keep their prior acceptance order; everything else falls
//! back to canonical key order.

use kube::Resource;
use mesh_api::networking::{AccessPolicySpec, FailoverServiceSpec, TrafficPolicySpec, VirtualMeshSpec};
use mesh_api::{
    AccessPolicy, ApprovalState, ClusterObjectRef, FailoverService, PolicyStatus, TrafficPolicy,
    VirtualMesh,
};

/// A policy kind carrying a [`PolicyStatus`]
pub trait ApprovablePolicy: Resource<DynamicType = ()> {
    type Spec: Clone;

    fn spec(&self) -> &Self::Spec;
    fn status(&self) -> Option<&PolicyStatus>;
    fn status_mut(&mut self) -> &mut Option<PolicyStatus>;

    /// Current spec generation (0 if the API server never set one)
    fn generation(&self) -> i64 {
        self.meta().generation.unwrap_or(0)
    }

    /// Whether the recorded status was computed for the current spec
    fn is_up_to_date(&self) -> bool {
        self.status()
            .is_some_and(|status| status.observed_generation == self.generation())
    }

    fn is_accepted(&self) -> bool {
        self.status()
            .is_some_and(|status| status.state == ApprovalState::Accepted)
    }
}

macro_rules! impl_approvable {
    ($kind:ty, $spec:ty) => {
        impl ApprovablePolicy for $kind {
            type Spec = $spec;

            fn spec(&self) -> &$spec {
                &self.spec
            }

            fn status(&self) -> Option<&PolicyStatus> {
                self.status.as_ref()
            }

            fn status_mut(&mut self) -> &mut Option<PolicyStatus> {
                &mut self.status
            }
        }
    };
}

impl_approvable!(TrafficPolicy, TrafficPolicySpec);
impl_approvable!(AccessPolicy, AccessPolicySpec);
impl_approvable!(VirtualMesh, VirtualMeshSpec);
impl_approvable!(FailoverService, FailoverServiceSpec);

/// Sort key of a policy for one target; derives a total order
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AcceptanceKey {
    rank: u8,
    order: u32,
    key: String,
}

impl AcceptanceKey {
    pub fn of<P: ApprovablePolicy>(policy: &P, target_key: &str) -> Self {
        let key = ClusterObjectRef::from_resource(policy).key();
        let prior = policy
            .status()
            .and_then(|status| status.approval_for(target_key));

        match prior {
            Some(approval) if approval.state == ApprovalState::Accepted => Self {
                rank: if policy.is_up_to_date() { 0 } else { 1 },
                order: approval.acceptance_order,
                key,
            },
            Some(_) => Self { rank: 2, order: 0, key },
            None => Self { rank: 3, order: 0, key },
        }
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }
}

/// Order candidates for a target, most established first
pub fn sort_by_acceptance<'a, P: ApprovablePolicy>(candidates: &mut [&'a P], target_key: &str) {
    candidates.sort_by_cached_key(|policy| AcceptanceKey::of(*policy, target_key));
}
