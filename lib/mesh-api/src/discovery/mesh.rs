use crate::networking::{AppliedFailoverService, AppliedVirtualMesh};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Mesh represents a discovered service mesh control plane instance
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "discovery.meshplane.io",
    version = "v1alpha1",
    kind = "Mesh",
    plural = "meshes",
    namespaced,
    derive = "Default",
    status = "MeshStatus",
)]
#[serde(rename_all = "camelCase")]
pub struct MeshSpec {
    /// Type of mesh and where it is installed
    pub mesh_type: MeshType,
}

/// The kind of control plane a Mesh represents
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum MeshType {
    Istio(MeshInstallation),
    Linkerd(MeshInstallation),
    ConsulConnect(MeshInstallation),
    AwsAppMesh(AppMeshInfo),
}

impl Default for MeshType {
    fn default() -> Self {
        MeshType::Istio(MeshInstallation::default())
    }
}

impl MeshType {
    /// Human readable mesh kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            MeshType::Istio(_) => "Istio",
            MeshType::Linkerd(_) => "Linkerd",
            MeshType::ConsulConnect(_) => "ConsulConnect",
            MeshType::AwsAppMesh(_) => "AwsAppMesh",
        }
    }

    /// In-cluster installation, if the mesh has one
    pub fn installation(&self) -> Option<&MeshInstallation> {
        match self {
            MeshType::Istio(installation)
            | MeshType::Linkerd(installation)
            | MeshType::ConsulConnect(installation) => Some(installation),
            MeshType::AwsAppMesh(_) => None,
        }
    }
}

/// Where a mesh control plane is installed
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeshInstallation {
    /// Cluster hosting the control plane
    pub cluster: String,

    /// Namespace of the control plane
    pub namespace: String,

    /// Control plane version, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// AWS App Mesh instance
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppMeshInfo {
    /// Name of the mesh in AWS
    pub aws_name: String,

    /// AWS region
    pub region: String,

    /// Clusters with workloads in this mesh
    #[serde(default)]
    pub clusters: Vec<String>,
}

/// Status of a Mesh
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeshStatus {
    #[serde(default)]
    pub observed_generation: i64,

    /// The VirtualMesh this mesh is grouped into, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_virtual_mesh: Option<AppliedVirtualMesh>,

    /// FailoverServices applied to this mesh, in acceptance order
    #[serde(default)]
    pub applied_failover_services: Vec<AppliedFailoverService>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installation_by_type() {
        let istio = MeshType::Istio(MeshInstallation {
            cluster: "east".to_string(),
            namespace: "istio-system".to_string(),
            version: None,
        });
        assert_eq!(istio.kind_name(), "Istio");
        assert_eq!(istio.installation().map(|i| i.cluster.as_str()), Some("east"));

        let app_mesh = MeshType::AwsAppMesh(AppMeshInfo::default());
        assert!(app_mesh.installation().is_none());
    }
}
