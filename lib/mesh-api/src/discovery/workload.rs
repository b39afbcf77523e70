use crate::ClusterObjectRef;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Workload is a discovered pod controller participating in a mesh
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "discovery.meshplane.io",
    version = "v1alpha1",
    kind = "Workload",
    plural = "workloads",
    namespaced,
    derive = "Default",
)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    /// The Kubernetes controller (Deployment, StatefulSet, ...) behind this workload
    pub kube_workload: KubeWorkload,

    /// Mesh the workload is injected into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<ClusterObjectRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeWorkload {
    /// Reference to the controller, including its cluster
    pub controller: ClusterObjectRef,

    /// Labels on the controller's pods
    #[serde(default)]
    pub pod_labels: BTreeMap<String, String>,

    /// Service account the pods run as
    #[serde(default = "default_service_account")]
    pub service_account_name: String,
}

impl KubeWorkload {
    /// Identity of the workload's service account
    pub fn service_account_ref(&self) -> ClusterObjectRef {
        ClusterObjectRef {
            name: self.service_account_name.clone(),
            namespace: self.controller.namespace.clone(),
            cluster_name: self.controller.cluster_name.clone(),
        }
    }
}

fn default_service_account() -> String {
    "default".to_string()
}
