/// Control plane settings and cluster registration

pub mod kubernetes_cluster;
#[allow(clippy::module_inception)]
pub mod settings;

pub use kubernetes_cluster::KubernetesCluster;
pub use settings::{GrpcServer, Settings, SettingsSpec};
