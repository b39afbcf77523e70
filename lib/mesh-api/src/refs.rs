//! Object references shared by every resource kind

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to an object by name, namespace and (optionally) the cluster it lives in.
///
/// This triple is the canonical identity of every entity in the control plane.
/// Objects stored on the management cluster carry no cluster name.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterObjectRef {
    /// Name of the object
    pub name: String,

    /// Namespace of the object
    pub namespace: String,

    /// Cluster the object lives in, if not the management cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
}

impl ClusterObjectRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            cluster_name: None,
        }
    }

    pub fn in_cluster(
        name: impl Into<String>,
        namespace: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            cluster_name: Some(cluster.into()),
        }
    }

    /// Build a reference from object metadata (management cluster objects)
    pub fn from_meta(meta: &ObjectMeta) -> Self {
        Self {
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            cluster_name: None,
        }
    }

    /// Build a reference to any Kubernetes resource
    pub fn from_resource<K: kube::Resource>(resource: &K) -> Self {
        Self::from_meta(resource.meta())
    }

    /// Canonical string key: `name.namespace` or `name.namespace.cluster`
    pub fn key(&self) -> String {
        match &self.cluster_name {
            Some(cluster) => format!("{}.{}.{}", self.name, self.namespace, cluster),
            None => format!("{}.{}", self.name, self.namespace),
        }
    }
}

impl fmt::Display for ClusterObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
