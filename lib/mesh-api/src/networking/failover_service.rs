use crate::{ClusterObjectRef, PolicyStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// FailoverService exposes a single hostname that fails over across an
/// ordered list of backing services, possibly in different meshes
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "networking.meshplane.io",
    version = "v1alpha1",
    kind = "FailoverService",
    plural = "failoverservices",
    namespaced,
    derive = "Default",
    status = "PolicyStatus",
    printcolumn = r#"{"name":"Hostname","type":"string","jsonPath":".spec.hostname"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
)]
#[serde(rename_all = "camelCase")]
pub struct FailoverServiceSpec {
    /// Hostname clients use to reach the service
    #[serde(default)]
    pub hostname: String,

    /// Port the service is exposed on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<FailoverPort>,

    /// Meshes the failover service is made available in
    #[serde(default)]
    pub meshes: Vec<ClusterObjectRef>,

    /// Backing services in failover priority order
    #[serde(default)]
    pub backing_services: Vec<BackingService>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FailoverPort {
    pub number: u32,

    #[serde(default)]
    pub protocol: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackingService {
    /// Kubernetes Service backing the failover service
    pub kube_service: ClusterObjectRef,
}
