//! Selector matching against destinations, workloads and identities
//!
//! An empty selector list matches everything. Otherwise a target matches if
//! any selector in the list matches it, and a selector matches only if every
//! field it declares holds. Labels are compared by exact key and value.

use mesh_api::discovery::destination::KubeService;
use mesh_api::selectors::{IdentitySelector, ServiceSelector, WorkloadSelector};
use mesh_api::{ClusterObjectRef, Destination, Workload};
use std::collections::BTreeMap;

/// Check whether a destination is selected
pub fn matches_destination(selectors: &[ServiceSelector], destination: &Destination) -> bool {
    matches_service(selectors, &destination.spec.kube_service)
}

/// Check whether a Kubernetes Service is selected
pub fn matches_service(selectors: &[ServiceSelector], service: &KubeService) -> bool {
    if selectors.is_empty() {
        return true;
    }

    selectors.iter().any(|selector| match selector {
        ServiceSelector::KubeServiceMatcher(matcher) => {
            labels_match(&matcher.labels, &service.labels)
                && value_allowed(&matcher.namespaces, &service.reference.namespace)
                && cluster_allowed(&matcher.clusters, service.reference.cluster_name.as_deref())
        }
        ServiceSelector::KubeServiceRefs(refs) => {
            refs.services.iter().any(|reference| reference == &service.reference)
        }
    })
}

/// Check whether a workload is selected
pub fn matches_workload(selectors: &[WorkloadSelector], workload: &Workload) -> bool {
    if selectors.is_empty() {
        return true;
    }

    let kube_workload = &workload.spec.kube_workload;
    selectors.iter().any(|selector| {
        labels_match(&selector.labels, &kube_workload.pod_labels)
            && value_allowed(&selector.namespaces, &kube_workload.controller.namespace)
            && cluster_allowed(
                &selector.clusters,
                kube_workload.controller.cluster_name.as_deref(),
            )
    })
}

/// Check whether a service account identity is selected
pub fn matches_identity(selectors: &[IdentitySelector], service_account: &ClusterObjectRef) -> bool {
    if selectors.is_empty() {
        return true;
    }

    selectors.iter().any(|selector| match selector {
        IdentitySelector::KubeIdentityMatcher(matcher) => {
            value_allowed(&matcher.namespaces, &service_account.namespace)
                && cluster_allowed(&matcher.clusters, service_account.cluster_name.as_deref())
        }
        IdentitySelector::KubeServiceAccountRefs(refs) => refs
            .service_accounts
            .iter()
            .any(|reference| reference == service_account),
    })
}

fn labels_match(required: &BTreeMap<String, String>, actual: &BTreeMap<String, String>) -> bool {
    required
        .iter()
        .all(|(key, value)| actual.get(key) == Some(value))
}

fn value_allowed(allowed: &[String], value: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|candidate| candidate == value)
}

fn cluster_allowed(allowed: &[String], cluster: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match cluster {
        Some(cluster) => allowed.iter().any(|candidate| candidate == cluster),
        None => false,
    }
}
