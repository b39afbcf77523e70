use crate::{ClusterObjectRef, PolicyStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// VirtualMesh federates several meshes into one trust and routing domain.
/// A mesh can belong to at most one VirtualMesh.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "networking.meshplane.io",
    version = "v1alpha1",
    kind = "VirtualMesh",
    plural = "virtualmeshes",
    namespaced,
    derive = "Default",
    status = "PolicyStatus",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMeshSpec {
    /// Meshes grouped by this VirtualMesh
    #[serde(default)]
    pub meshes: Vec<ClusterObjectRef>,

    /// Shared identity configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtls_config: Option<MtlsConfig>,

    /// How services are exposed across meshes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation: Option<Federation>,

    /// Whether an AccessPolicy is required for cross-mesh traffic
    #[serde(default)]
    pub global_access_policy: GlobalAccessPolicy,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MtlsConfig {
    #[serde(default)]
    pub trust_model: TrustModel,

    /// Restart pods once new certificates are issued
    #[serde(default)]
    pub auto_restart_pods: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustModel {
    /// All meshes share a root of trust
    #[default]
    Shared,
    /// Meshes keep their own roots and trust is established by gateway
    Limited,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Federation {
    #[serde(default)]
    pub mode: FederationMode,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FederationMode {
    /// Every service is exposed to every mesh in the VirtualMesh
    #[default]
    Permissive,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlobalAccessPolicy {
    #[default]
    Disabled,
    Enabled,
}
