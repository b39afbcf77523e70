use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings configures the control plane itself
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "settings.meshplane.io",
    version = "v1alpha1",
    kind = "Settings",
    plural = "settings",
    namespaced,
    derive = "Default",
)]
pub struct SettingsSpec {
    /// FailoverService settings
    #[serde(default)]
    pub failover: FailoverSettings,

    /// Networking extension servers
    #[serde(default)]
    pub extensions: ExtensionsSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailoverSettings {
    /// Suffix every FailoverService hostname must end with
    #[serde(default = "default_hostname_suffix")]
    pub hostname_suffix: String,
}

impl Default for FailoverSettings {
    fn default() -> Self {
        Self {
            hostname_suffix: default_hostname_suffix(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionsSettings {
    /// gRPC servers that may patch generated configuration and push change notifications
    #[serde(default)]
    pub grpc_servers: Vec<GrpcServer>,
}

/// Connection options for one extension server
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrpcServer {
    /// host:port of the server
    pub address: String,

    /// Connect without TLS
    #[serde(default)]
    pub insecure: bool,

    /// Retry the initial connection on transient network failures
    #[serde(default)]
    pub reconnect_on_network_failures: bool,
}

fn default_hostname_suffix() -> String {
    ".global".to_string()
}
