//! Status types shared by the networking policy kinds

use crate::ClusterObjectRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Approval state of a policy, globally or for one target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalState {
    /// Not yet processed
    #[default]
    Pending,
    /// Applied to its targets
    Accepted,
    /// Rejected; see the accompanying errors
    Invalid,
}

/// Approval of a policy for a single target (a destination or a mesh)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStatus {
    /// Relative priority among the policies accepted for the same target.
    /// Lower values were accepted first and win conflicts.
    #[serde(default)]
    pub acceptance_order: u32,

    #[serde(default)]
    pub state: ApprovalState,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Status of a TrafficPolicy, AccessPolicy, VirtualMesh or FailoverService
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatus {
    /// Generation of the spec this status was computed for
    #[serde(default)]
    pub observed_generation: i64,

    #[serde(default)]
    pub state: ApprovalState,

    /// Reasons the policy is invalid
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    /// Per-target approval, keyed by the canonical key of the destination
    /// (traffic and access policies) or mesh (virtual meshes and failover services)
    #[serde(default)]
    pub approvals: BTreeMap<String, ApprovalStatus>,
}

impl PolicyStatus {
    /// Optimistic status for a policy about to be (re)approved
    pub fn accepted(observed_generation: i64) -> Self {
        Self {
            observed_generation,
            state: ApprovalState::Accepted,
            errors: Vec::new(),
            approvals: BTreeMap::new(),
        }
    }

    /// Mark the policy invalid, recording the reasons
    pub fn invalidate<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.state = ApprovalState::Invalid;
        self.errors.extend(errors);
    }

    pub fn approval_for(&self, target_key: &str) -> Option<&ApprovalStatus> {
        self.approvals.get(target_key)
    }
}

/// Snapshot of a policy as it was applied to a target
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPolicy<S> {
    /// Reference to the applied policy
    #[serde(rename = "ref")]
    pub reference: ClusterObjectRef,

    /// Spec of the policy at the time it was applied
    pub spec: S,

    /// Generation of the policy at the time it was applied
    #[serde(default)]
    pub observed_generation: i64,
}
