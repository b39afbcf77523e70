use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// KubernetesCluster registers a workload cluster with the control plane.
/// The object name is the cluster name used throughout selectors and refs.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "multicluster.meshplane.io",
    version = "v1alpha1",
    kind = "KubernetesCluster",
    plural = "kubernetesclusters",
    namespaced,
    derive = "Default",
)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesClusterSpec {
    /// Secret holding the kubeconfig for the cluster
    pub secret_name: String,

    /// DNS domain of the cluster
    #[serde(default = "default_cluster_domain")]
    pub cluster_domain: String,
}

fn default_cluster_domain() -> String {
    "cluster.local".to_string()
}
