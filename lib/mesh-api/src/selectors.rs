//! Selectors used by policies to choose destinations, workloads and identities

use crate::ClusterObjectRef;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selects destinations either by matching their backing Kubernetes Service
/// or by referencing the Services directly
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ServiceSelector {
    /// Match Services by labels, namespaces and clusters
    KubeServiceMatcher(KubeServiceMatcher),
    /// Match an explicit list of Services
    KubeServiceRefs(KubeServiceRefs),
}

/// Label/namespace/cluster matcher for Kubernetes Services.
/// Fields left empty are not taken into account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeServiceMatcher {
    /// Labels the Service must carry (exact key/value match)
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Namespaces the Service may live in
    #[serde(default)]
    pub namespaces: Vec<String>,

    /// Clusters the Service may live in
    #[serde(default)]
    pub clusters: Vec<String>,
}

/// Explicit list of Kubernetes Services
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeServiceRefs {
    #[serde(default)]
    pub services: Vec<ClusterObjectRef>,
}

/// Selects workloads by pod labels, namespaces and clusters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSelector {
    /// Pod labels the workload must carry
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Namespaces the workload may live in
    #[serde(default)]
    pub namespaces: Vec<String>,

    /// Clusters the workload may live in
    #[serde(default)]
    pub clusters: Vec<String>,
}

/// Selects the source identities (service accounts) of a request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum IdentitySelector {
    /// Match service accounts by namespace and cluster
    KubeIdentityMatcher(KubeIdentityMatcher),
    /// Match an explicit list of service accounts
    KubeServiceAccountRefs(KubeServiceAccountRefs),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeIdentityMatcher {
    #[serde(default)]
    pub namespaces: Vec<String>,

    #[serde(default)]
    pub clusters: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeServiceAccountRefs {
    #[serde(default)]
    pub service_accounts: Vec<ClusterObjectRef>,
}

impl ServiceSelector {
    /// Cluster names named by this selector, explicit or via refs
    pub fn cluster_names(&self) -> Vec<&str> {
        match self {
            ServiceSelector::KubeServiceMatcher(matcher) => {
                matcher.clusters.iter().map(String::as_str).collect()
            }
            ServiceSelector::KubeServiceRefs(refs) => refs
                .services
                .iter()
                .filter_map(|service| service.cluster_name.as_deref())
                .collect(),
        }
    }
}

impl IdentitySelector {
    pub fn cluster_names(&self) -> Vec<&str> {
        match self {
            IdentitySelector::KubeIdentityMatcher(matcher) => {
                matcher.clusters.iter().map(String::as_str).collect()
            }
            IdentitySelector::KubeServiceAccountRefs(refs) => refs
                .service_accounts
                .iter()
                .filter_map(|account| account.cluster_name.as_deref())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_selector_wire_format() {
        let json = serde_json::json!({
            "kubeServiceRefs": {
                "services": [{"name": "reviews", "namespace": "bookinfo", "clusterName": "east"}]
            }
        });
        let selector: ServiceSelector = serde_json::from_value(json).unwrap();
        assert_eq!(
            selector,
            ServiceSelector::KubeServiceRefs(KubeServiceRefs {
                services: vec![ClusterObjectRef::in_cluster("reviews", "bookinfo", "east")],
            })
        );
        assert_eq!(selector.cluster_names(), vec!["east"]);
    }

    #[test]
    fn test_matcher_defaults_to_empty_fields() {
        let json = serde_json::json!({"kubeServiceMatcher": {"namespaces": ["bookinfo"]}});
        let selector: ServiceSelector = serde_json::from_value(json).unwrap();
        match selector {
            ServiceSelector::KubeServiceMatcher(matcher) => {
                assert!(matcher.labels.is_empty());
                assert!(matcher.clusters.is_empty());
                assert_eq!(matcher.namespaces, vec!["bookinfo".to_string()]);
            }
            other => panic!("unexpected selector {:?}", other),
        }
    }
}
