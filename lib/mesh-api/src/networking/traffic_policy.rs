use crate::selectors::{ServiceSelector, WorkloadSelector};
use crate::{ClusterObjectRef, PolicyStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// TrafficPolicy configures how requests from selected workloads to selected
/// destinations are routed and handled
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "networking.meshplane.io",
    version = "v1alpha1",
    kind = "TrafficPolicy",
    plural = "trafficpolicies",
    namespaced,
    derive = "Default",
    status = "PolicyStatus",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPolicySpec {
    /// Workloads whose outbound requests are affected. Empty selects all.
    #[serde(default)]
    pub source_selector: Vec<WorkloadSelector>,

    /// Destinations whose inbound requests are affected. Empty selects all.
    #[serde(default)]
    pub destination_selector: Vec<ServiceSelector>,

    /// Request timeout (milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u32>,

    /// Retry policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<RetryPolicy>,

    /// Split traffic across several services
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_shift: Option<TrafficShift>,

    /// Inject faults for testing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_injection: Option<FaultInjection>,

    /// Mirror a share of traffic to another service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<Mirror>,

    /// Eject misbehaving endpoints. Required before a destination can back a FailoverService.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_detection: Option<OutlierDetection>,

    /// Add or remove headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_manipulation: Option<HeaderManipulation>,
}

/// Retry policy
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Number of retries for a request
    pub attempts: u32,

    /// Timeout per retry attempt (milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_try_timeout_ms: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrafficShift {
    /// Weighted destinations
    #[serde(default)]
    pub destinations: Vec<WeightedDestination>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeightedDestination {
    /// Kubernetes Service receiving this share of traffic
    pub kube_service: ClusterObjectRef,

    /// Subset labels on the target service's pods
    #[serde(default)]
    pub subset: BTreeMap<String, String>,

    /// Port override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,

    /// Relative weight
    #[serde(default = "default_weight")]
    pub weight: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FaultInjection {
    /// Fixed delay before forwarding (milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_delay_ms: Option<u32>,

    /// HTTP status to abort with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_http_status: Option<u32>,

    /// Percentage of requests to inject the fault into
    pub percentage: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Mirror {
    /// Kubernetes Service receiving mirrored traffic
    pub kube_service: ClusterObjectRef,

    /// Percentage of traffic to mirror
    #[serde(default = "default_mirror_percentage")]
    pub percentage: f64,

    /// Port on the mirror service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
}

/// Outlier detection configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlierDetection {
    /// Consecutive errors before an endpoint is ejected
    #[serde(default = "default_consecutive_errors")]
    pub consecutive_errors: u32,

    /// Interval between ejection sweeps (seconds)
    #[serde(default = "default_interval")]
    pub interval_seconds: u32,

    /// Minimum ejection duration (seconds)
    #[serde(default = "default_base_ejection_time")]
    pub base_ejection_time_seconds: u32,

    /// Maximum share of endpoints that may be ejected
    #[serde(default = "default_max_ejection_percent")]
    pub max_ejection_percent: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeaderManipulation {
    #[serde(default)]
    pub append_request_headers: BTreeMap<String, String>,

    #[serde(default)]
    pub remove_request_headers: Vec<String>,

    #[serde(default)]
    pub append_response_headers: BTreeMap<String, String>,

    #[serde(default)]
    pub remove_response_headers: Vec<String>,
}

fn default_weight() -> u32 {
    1
}

fn default_mirror_percentage() -> f64 {
    100.0
}

fn default_consecutive_errors() -> u32 {
    5
}

fn default_interval() -> u32 {
    10
}

fn default_base_ejection_time() -> u32 {
    30
}

fn default_max_ejection_percent() -> u32 {
    100
}
