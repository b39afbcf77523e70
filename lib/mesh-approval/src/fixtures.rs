//! Builders shared by the approval tests

use mesh_api::discovery::destination::{DestinationSpec, KubeService};
use mesh_api::discovery::mesh::{MeshInstallation, MeshSpec, MeshStatus, MeshType};
use mesh_api::discovery::workload::{KubeWorkload, WorkloadSpec};
use mesh_api::networking::failover_service::{BackingService, FailoverPort};
use mesh_api::networking::traffic_policy::OutlierDetection;
use mesh_api::networking::{
    AccessPolicySpec, AppliedVirtualMesh, FailoverServiceSpec, TrafficPolicySpec, VirtualMeshSpec,
};
use mesh_api::selectors::{KubeServiceRefs, ServiceSelector};
use mesh_api::settings::kubernetes_cluster::KubernetesClusterSpec;
use mesh_api::{
    AccessPolicy, ClusterObjectRef, Destination, FailoverService, KubernetesCluster, Mesh,
    TrafficPolicy, VirtualMesh, Workload,
};
use mesh_core::{Reporter, Snapshot, Translator};
use std::collections::BTreeMap;

pub const NAMESPACE: &str = "mesh-system";

pub fn object_ref(name: &str) -> ClusterObjectRef {
    ClusterObjectRef::new(name, NAMESPACE)
}

pub fn service_ref(name: &str, cluster: &str) -> ClusterObjectRef {
    ClusterObjectRef::in_cluster(name, "bookinfo", cluster)
}

fn place<K: kube::Resource>(mut object: K) -> K {
    let meta = object.meta_mut();
    meta.namespace = Some(NAMESPACE.to_string());
    meta.generation = Some(1);
    object
}

pub fn mesh(name: &str, cluster: &str) -> Mesh {
    place(Mesh::new(
        name,
        MeshSpec {
            mesh_type: MeshType::Istio(MeshInstallation {
                cluster: cluster.to_string(),
                namespace: "istio-system".to_string(),
                version: None,
            }),
        },
    ))
}

/// Mesh already grouped into the given VirtualMesh
pub fn federated_mesh(name: &str, cluster: &str, virtual_mesh: &str) -> Mesh {
    let mut mesh = mesh(name, cluster);
    mesh.status = Some(MeshStatus {
        observed_generation: 1,
        applied_virtual_mesh: Some(AppliedVirtualMesh {
            reference: object_ref(virtual_mesh),
            spec: VirtualMeshSpec::default(),
            observed_generation: 1,
        }),
        applied_failover_services: Vec::new(),
    });
    mesh
}

pub fn destination(name: &str, service: ClusterObjectRef, mesh: &str) -> Destination {
    place(Destination::new(
        name,
        DestinationSpec {
            kube_service: KubeService {
                reference: service,
                labels: BTreeMap::from([("app".to_string(), name.to_string())]),
                ..Default::default()
            },
            mesh: Some(object_ref(mesh)),
        },
    ))
}

pub fn workload(name: &str, service_account: &str, cluster: &str) -> Workload {
    place(Workload::new(
        name,
        WorkloadSpec {
            kube_workload: KubeWorkload {
                controller: ClusterObjectRef::in_cluster(name, "bookinfo", cluster),
                pod_labels: BTreeMap::new(),
                service_account_name: service_account.to_string(),
            },
            mesh: None,
        },
    ))
}

pub fn cluster(name: &str) -> KubernetesCluster {
    place(KubernetesCluster::new(
        name,
        KubernetesClusterSpec {
            secret_name: format!("{}-kubeconfig", name),
            cluster_domain: "cluster.local".to_string(),
        },
    ))
}

pub fn traffic_policy(name: &str, spec: TrafficPolicySpec) -> TrafficPolicy {
    place(TrafficPolicy::new(name, spec))
}

/// TrafficPolicy selecting every destination
pub fn match_all_traffic_policy(name: &str) -> TrafficPolicy {
    traffic_policy(name, TrafficPolicySpec::default())
}

/// TrafficPolicy configuring outlier detection on the given services
pub fn outlier_policy(name: &str, services: Vec<ClusterObjectRef>) -> TrafficPolicy {
    traffic_policy(
        name,
        TrafficPolicySpec {
            destination_selector: vec![ServiceSelector::KubeServiceRefs(KubeServiceRefs {
                services,
            })],
            outlier_detection: Some(OutlierDetection {
                consecutive_errors: 5,
                interval_seconds: 10,
                base_ejection_time_seconds: 30,
                max_ejection_percent: 100,
            }),
            ..Default::default()
        },
    )
}

pub fn access_policy(name: &str, spec: AccessPolicySpec) -> AccessPolicy {
    place(AccessPolicy::new(name, spec))
}

pub fn virtual_mesh(name: &str, meshes: &[&str]) -> VirtualMesh {
    place(VirtualMesh::new(
        name,
        VirtualMeshSpec {
            meshes: meshes.iter().map(|mesh| object_ref(mesh)).collect(),
            ..Default::default()
        },
    ))
}

/// A FailoverService that is valid once its backing services carry outlier detection
pub fn failover_service(name: &str, meshes: &[&str], backing: Vec<ClusterObjectRef>) -> FailoverService {
    place(FailoverService::new(
        name,
        FailoverServiceSpec {
            hostname: format!("{}.bookinfo.global", name),
            port: Some(FailoverPort {
                number: 9080,
                protocol: "http".to_string(),
            }),
            meshes: meshes.iter().map(|mesh| object_ref(mesh)).collect(),
            backing_services: backing
                .into_iter()
                .map(|kube_service| BackingService { kube_service })
                .collect(),
        },
    ))
}

/// Snapshot with two meshes in two registered clusters and one destination per mesh
pub fn two_cluster_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::default();
    snapshot.meshes.insert(mesh("istio-east", "east"));
    snapshot.meshes.insert(mesh("istio-west", "west"));
    snapshot.clusters.insert(cluster("east"));
    snapshot.clusters.insert(cluster("west"));
    snapshot
        .destinations
        .insert(destination("reviews-east", service_ref("reviews", "east"), "istio-east"));
    snapshot
        .destinations
        .insert(destination("reviews-west", service_ref("reviews", "west"), "istio-west"));
    snapshot
}

/// Translator that reports a fixed set of incompatibilities on every run
#[derive(Default)]
pub struct FlaggingTranslator {
    pub traffic_policies: Vec<(ClusterObjectRef, ClusterObjectRef, String)>,
    pub access_policies: Vec<(ClusterObjectRef, ClusterObjectRef, String)>,
    pub virtual_meshes: Vec<(ClusterObjectRef, ClusterObjectRef, String)>,
    pub failover_services: Vec<(Option<ClusterObjectRef>, ClusterObjectRef, String)>,
    pub fail: bool,
}

impl FlaggingTranslator {
    pub fn traffic_policy(mut self, destination: &str, policy: &str, message: &str) -> Self {
        self.traffic_policies
            .push((object_ref(destination), object_ref(policy), message.to_string()));
        self
    }

    pub fn access_policy(mut self, destination: &str, policy: &str, message: &str) -> Self {
        self.access_policies
            .push((object_ref(destination), object_ref(policy), message.to_string()));
        self
    }

    pub fn virtual_mesh(mut self, mesh: &str, virtual_mesh: &str, message: &str) -> Self {
        self.virtual_meshes
            .push((object_ref(mesh), object_ref(virtual_mesh), message.to_string()));
        self
    }

    pub fn failover_service(mut self, mesh: Option<&str>, failover: &str, message: &str) -> Self {
        self.failover_services.push((
            mesh.map(object_ref),
            object_ref(failover),
            message.to_string(),
        ));
        self
    }
}

impl Translator for FlaggingTranslator {
    type Output = ();

    fn translate(&self, _snapshot: &Snapshot, reporter: &mut dyn Reporter) -> anyhow::Result<()> {
        for (destination, policy, message) in &self.traffic_policies {
            reporter.report_traffic_policy(destination, policy, anyhow::anyhow!(message.clone()));
        }
        for (destination, policy, message) in &self.access_policies {
            reporter.report_access_policy(destination, policy, anyhow::anyhow!(message.clone()));
        }
        for (mesh, virtual_mesh, message) in &self.virtual_meshes {
            reporter.report_virtual_mesh(mesh, virtual_mesh, anyhow::anyhow!(message.clone()));
        }
        for (mesh, failover, message) in &self.failover_services {
            reporter.report_failover_service(
                mesh.as_ref(),
                failover,
                anyhow::anyhow!(message.clone()),
            );
        }
        if self.fail {
            anyhow::bail!("translator exploded");
        }
        Ok(())
    }
}
