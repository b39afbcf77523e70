//! Builds a fresh snapshot from the management cluster

use anyhow::{Context, Result};
use kube::api::ListParams;
use kube::{Api, Client, Resource};
use mesh_api::{
    AccessPolicy, Destination, FailoverService, KubernetesCluster, Mesh, Settings, TrafficPolicy,
    VirtualMesh, Workload,
};
use mesh_core::{ResourceSet, Snapshot};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, warn};

pub struct SnapshotLoader {
    client: Client,
    settings_name: String,
    settings_namespace: String,
}

impl SnapshotLoader {
    pub fn new(client: Client, settings_name: String, settings_namespace: String) -> Self {
        Self {
            client,
            settings_name,
            settings_namespace,
        }
    }

    pub async fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot {
            meshes: self.list::<Mesh>().await?,
            destinations: self.list::<Destination>().await?,
            workloads: self.list::<Workload>().await?,
            traffic_policies: self.list::<TrafficPolicy>().await?,
            access_policies: self.list::<AccessPolicy>().await?,
            virtual_meshes: self.list::<VirtualMesh>().await?,
            failover_services: self.list::<FailoverService>().await?,
            clusters: self.list::<KubernetesCluster>().await?,
            settings: self.settings().await?,
        };
        debug!(
            meshes = snapshot.meshes.len(),
            destinations = snapshot.destinations.len(),
            traffic_policies = snapshot.traffic_policies.len(),
            access_policies = snapshot.access_policies.len(),
            virtual_meshes = snapshot.virtual_meshes.len(),
            failover_services = snapshot.failover_services.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// The configured Settings object, if it exists
    pub async fn settings(&self) -> Result<ResourceSet<Settings>> {
        let api: Api<Settings> = Api::namespaced(self.client.clone(), &self.settings_namespace);
        let settings = api
            .get_opt(&self.settings_name)
            .await
            .with_context(|| {
                format!(
                    "failed to get Settings {}/{}",
                    self.settings_namespace, self.settings_name
                )
            })?;
        if settings.is_none() {
            warn!(
                "Settings {}/{} not found, using defaults",
                self.settings_namespace, self.settings_name
            );
        }
        Ok(settings.into_iter().collect())
    }

    async fn list<K>(&self) -> Result<ResourceSet<K>>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let objects = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list {}", K::kind(&())))?;
        Ok(objects.items.into_iter().collect())
    }
}
