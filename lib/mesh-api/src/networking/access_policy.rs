use crate::selectors::{IdentitySelector, ServiceSelector};
use crate::PolicyStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// AccessPolicy allows requests from selected identities to selected destinations
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "networking.meshplane.io",
    version = "v1alpha1",
    kind = "AccessPolicy",
    plural = "accesspolicies",
    namespaced,
    derive = "Default",
    status = "PolicyStatus",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicySpec {
    /// Identities allowed to send requests. Empty allows all.
    #[serde(default)]
    pub source_selector: Vec<IdentitySelector>,

    /// Destinations the requests may reach. Empty selects all.
    #[serde(default)]
    pub destination_selector: Vec<ServiceSelector>,

    /// Allowed request paths; empty allows all
    #[serde(default)]
    pub allowed_paths: Vec<String>,

    /// Allowed HTTP methods; empty allows all
    #[serde(default)]
    pub allowed_methods: Vec<String>,

    /// Allowed destination ports; empty allows all
    #[serde(default)]
    pub allowed_ports: Vec<u32>,
}
