//! Resolution of every reference embedded in a policy spec
//!
//! Each policy kind is checked against the discovery sets of the snapshot.
//! All references are checked; a policy with any unresolved reference is
//! excluded from every applied list by the approver.

use crate::ValidationError;
use mesh_api::networking::{
    AccessPolicySpec, FailoverServiceSpec, TrafficPolicySpec, VirtualMeshSpec,
};
use mesh_api::selectors::{IdentitySelector, ServiceSelector};
use mesh_api::ClusterObjectRef;
use mesh_core::{ResourceSet, Snapshot};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Reference errors per policy kind, keyed by the policy's canonical key.
/// Policies without errors have no entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceErrors {
    pub traffic_policies: BTreeMap<String, Vec<ValidationError>>,
    pub access_policies: BTreeMap<String, Vec<ValidationError>>,
    pub virtual_meshes: BTreeMap<String, Vec<ValidationError>>,
    pub failover_services: BTreeMap<String, Vec<ValidationError>>,
}

impl ReferenceErrors {
    /// Number of invalid policies across all kinds
    pub fn len(&self) -> usize {
        self.traffic_policies.len()
            + self.access_policies.len()
            + self.virtual_meshes.len()
            + self.failover_services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate the references of every policy in the snapshot
pub fn validate_references(snapshot: &Snapshot) -> ReferenceErrors {
    let errors = ReferenceErrors {
        traffic_policies: collect(&snapshot.traffic_policies, |policy| {
            validate_traffic_policy(&policy.spec, snapshot)
        }),
        access_policies: collect(&snapshot.access_policies, |policy| {
            validate_access_policy(&policy.spec, snapshot)
        }),
        virtual_meshes: collect(&snapshot.virtual_meshes, |virtual_mesh| {
            validate_virtual_mesh(&virtual_mesh.spec, snapshot)
        }),
        failover_services: collect(&snapshot.failover_services, |failover| {
            validate_failover_service_refs(&failover.spec, snapshot)
        }),
    };

    debug!(invalid = errors.len(), "Reference validation complete");
    errors
}

pub fn validate_traffic_policy(spec: &TrafficPolicySpec, snapshot: &Snapshot) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut clusters = BTreeSet::new();

    check_service_selectors(&spec.destination_selector, snapshot, &mut errors, &mut clusters);

    for selector in &spec.source_selector {
        clusters.extend(selector.clusters.iter().map(String::as_str));
    }

    if let Some(shift) = &spec.traffic_shift {
        for weighted in &shift.destinations {
            check_destination(&weighted.kube_service, snapshot, &mut errors);
        }
    }

    if let Some(mirror) = &spec.mirror {
        check_destination(&mirror.kube_service, snapshot, &mut errors);
    }

    check_clusters(clusters, snapshot, &mut errors);
    errors
}

pub fn validate_access_policy(spec: &AccessPolicySpec, snapshot: &Snapshot) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut clusters = BTreeSet::new();

    check_service_selectors(&spec.destination_selector, snapshot, &mut errors, &mut clusters);

    for selector in &spec.source_selector {
        clusters.extend(selector.cluster_names());
        if let IdentitySelector::KubeServiceAccountRefs(refs) = selector {
            for account in &refs.service_accounts {
                if !snapshot.has_service_account(account) {
                    errors.push(ValidationError::reference("ServiceAccount", account));
                }
            }
        }
    }

    check_clusters(clusters, snapshot, &mut errors);
    errors
}

pub fn validate_virtual_mesh(spec: &VirtualMeshSpec, snapshot: &Snapshot) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_meshes(&spec.meshes, snapshot, &mut errors);
    errors
}

pub fn validate_failover_service_refs(
    spec: &FailoverServiceSpec,
    snapshot: &Snapshot,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_meshes(&spec.meshes, snapshot, &mut errors);
    for backing in &spec.backing_services {
        check_destination(&backing.kube_service, snapshot, &mut errors);
    }
    errors
}

fn collect<K, F>(set: &ResourceSet<K>, validate: F) -> BTreeMap<String, Vec<ValidationError>>
where
    K: kube::Resource<DynamicType = ()>,
    F: Fn(&K) -> Vec<ValidationError>,
{
    set.iter()
        .filter_map(|object| {
            let errors = validate(object);
            if errors.is_empty() {
                return None;
            }
            let key = ClusterObjectRef::from_resource(object).key();
            debug!(policy = %key, kind = set.kind(), "Unresolved references: {}", errors.len());
            Some((key, errors))
        })
        .collect()
}

fn check_service_selectors<'a>(
    selectors: &'a [ServiceSelector],
    snapshot: &Snapshot,
    errors: &mut Vec<ValidationError>,
    clusters: &mut BTreeSet<&'a str>,
) {
    for selector in selectors {
        clusters.extend(selector.cluster_names());
        if let ServiceSelector::KubeServiceRefs(refs) = selector {
            for service in &refs.services {
                check_destination(service, snapshot, errors);
            }
        }
    }
}

fn check_destination(service: &ClusterObjectRef, snapshot: &Snapshot, errors: &mut Vec<ValidationError>) {
    if snapshot.destination_for_service(service).is_none() {
        errors.push(ValidationError::reference("Destination", service));
    }
}

fn check_meshes(meshes: &[ClusterObjectRef], snapshot: &Snapshot, errors: &mut Vec<ValidationError>) {
    for mesh in meshes {
        if !snapshot.meshes.contains(mesh) {
            errors.push(ValidationError::reference("Mesh", mesh));
        }
    }
}

fn check_clusters(clusters: BTreeSet<&str>, snapshot: &Snapshot, errors: &mut Vec<ValidationError>) {
    for cluster in clusters {
        if !snapshot.has_cluster(cluster) {
            errors.push(ValidationError::reference("KubernetesCluster", cluster));
        }
    }
}
