//! Snapshot of discovered and declared resources for one reconciliation pass

use crate::{CoreError, Result};
use kube::Resource;
use mesh_api::{
    AccessPolicy, ClusterObjectRef, Destination, FailoverService, KubernetesCluster, Mesh,
    Settings, TrafficPolicy, VirtualMesh, Workload,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Suffix FailoverService hostnames must carry when no Settings override it
pub const DEFAULT_HOSTNAME_SUFFIX: &str = ".global";

/// Typed collection of one resource kind, indexed and ordered by canonical key
#[derive(Clone, Debug)]
pub struct ResourceSet<K> {
    kind: String,
    // Map of canonical key (name.namespace) to object
    items: BTreeMap<String, K>,
}

impl<K> ResourceSet<K>
where
    K: Resource<DynamicType = ()>,
{
    pub fn new() -> Self {
        Self {
            kind: K::kind(&()).into_owned(),
            items: BTreeMap::new(),
        }
    }

    /// Insert or replace an object, returning the previous one
    pub fn insert(&mut self, object: K) -> Option<K> {
        let key = ClusterObjectRef::from_resource(&object).key();
        self.items.insert(key, object)
    }

    /// Look up an object by reference
    pub fn find(&self, reference: &ClusterObjectRef) -> Result<&K> {
        self.items
            .get(&reference.key())
            .ok_or_else(|| self.not_found(reference))
    }

    /// Look up an object by reference for status updates
    pub fn find_mut(&mut self, reference: &ClusterObjectRef) -> Result<&mut K> {
        let kind = &self.kind;
        match self.items.get_mut(&reference.key()) {
            Some(object) => Ok(object),
            None => Err(CoreError::NotFound {
                kind: kind.clone(),
                key: reference.key(),
            }),
        }
    }

    pub fn contains(&self, reference: &ClusterObjectRef) -> bool {
        self.items.contains_key(&reference.key())
    }

    /// Objects in key order
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut K> {
        self.items.values_mut()
    }

    /// All objects in key order
    pub fn list(&self) -> Vec<&K> {
        self.items.values().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Kind name used in error messages
    pub fn kind(&self) -> &str {
        &self.kind
    }

    fn not_found(&self, reference: &ClusterObjectRef) -> CoreError {
        CoreError::NotFound {
            kind: self.kind.clone(),
            key: reference.key(),
        }
    }
}

impl<K> Default for ResourceSet<K>
where
    K: Resource<DynamicType = ()>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> FromIterator<K> for ResourceSet<K>
where
    K: Resource<DynamicType = ()>,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for object in iter {
            set.insert(object);
        }
        set
    }
}

/// Point-in-time view of every resource the approval engine reads or updates
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub meshes: ResourceSet<Mesh>,
    pub destinations: ResourceSet<Destination>,
    pub workloads: ResourceSet<Workload>,
    pub traffic_policies: ResourceSet<TrafficPolicy>,
    pub access_policies: ResourceSet<AccessPolicy>,
    pub virtual_meshes: ResourceSet<VirtualMesh>,
    pub failover_services: ResourceSet<FailoverService>,
    pub clusters: ResourceSet<KubernetesCluster>,
    pub settings: ResourceSet<Settings>,
}

impl Snapshot {
    /// Destination backed by the given Kubernetes Service
    pub fn destination_for_service(&self, service: &ClusterObjectRef) -> Option<&Destination> {
        self.destinations
            .iter()
            .find(|destination| destination.service_ref() == service)
    }

    /// Whether any workload runs as the given service account
    pub fn has_service_account(&self, service_account: &ClusterObjectRef) -> bool {
        self.workloads
            .iter()
            .any(|workload| &workload.spec.kube_workload.service_account_ref() == service_account)
    }

    /// Whether a cluster with this name is registered
    pub fn has_cluster(&self, cluster_name: &str) -> bool {
        self.clusters
            .iter()
            .any(|cluster| cluster.metadata.name.as_deref() == Some(cluster_name))
    }

    /// Hostname suffix required on FailoverServices
    pub fn failover_hostname_suffix(&self) -> &str {
        match self.settings.iter().next() {
            Some(settings) => settings.spec.failover.hostname_suffix.as_str(),
            None => {
                debug!("No Settings in snapshot, using default hostname suffix");
                DEFAULT_HOSTNAME_SUFFIX
            }
        }
    }
}
