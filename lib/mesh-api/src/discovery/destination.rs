use crate::networking::{AppliedAccessPolicy, AppliedTrafficPolicy};
use crate::ClusterObjectRef;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Destination is a discovered, routable service that policies may target
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "discovery.meshplane.io",
    version = "v1alpha1",
    kind = "Destination",
    plural = "destinations",
    namespaced,
    derive = "Default",
    status = "DestinationStatus",
)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSpec {
    /// The Kubernetes Service backing this destination
    pub kube_service: KubeService,

    /// Mesh that owns this destination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<ClusterObjectRef>,
}

/// A Kubernetes Service in one of the registered clusters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeService {
    /// Reference to the Service, including its cluster
    #[serde(rename = "ref")]
    pub reference: ClusterObjectRef,

    /// Labels on the Service
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Selector the Service uses to pick its pods
    #[serde(default)]
    pub workload_selector_labels: BTreeMap<String, String>,

    /// Ports exposed by the Service
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ServicePort {
    pub port: u32,

    #[serde(default)]
    pub name: String,

    #[serde(default = "default_protocol")]
    pub protocol: String,
}

/// Status of a Destination
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DestinationStatus {
    #[serde(default)]
    pub observed_generation: i64,

    /// TrafficPolicies applied to this destination, in acceptance order
    #[serde(default)]
    pub applied_traffic_policies: Vec<AppliedTrafficPolicy>,

    /// AccessPolicies applied to this destination, in acceptance order
    #[serde(default)]
    pub applied_access_policies: Vec<AppliedAccessPolicy>,
}

impl Destination {
    /// Reference to the backing Kubernetes Service
    pub fn service_ref(&self) -> &ClusterObjectRef {
        &self.spec.kube_service.reference
    }

    /// TrafficPolicies currently applied to this destination
    pub fn applied_traffic_policies(&self) -> &[AppliedTrafficPolicy] {
        self.status
            .as_ref()
            .map(|status| status.applied_traffic_policies.as_slice())
            .unwrap_or_default()
    }
}

fn default_protocol() -> String {
    "TCP".to_string()
}
