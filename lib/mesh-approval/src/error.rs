use thiserror::Error;

/// Reasons a policy is rejected. The `Display` output is what ends up in
/// status `errors`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} {reference} not found")]
    Reference {
        kind: &'static str,
        reference: String,
    },

    #[error("hostname {hostname:?} is not a valid DNS-1123 subdomain: {reason}")]
    InvalidHostname { hostname: String, reason: String },

    #[error("hostname {hostname:?} must end with {suffix:?}")]
    MissingHostnameSuffix { hostname: String, suffix: String },

    #[error("port must be specified")]
    MissingPort,

    #[error("port number {0} is outside 1-65535")]
    InvalidPort(u32),

    #[error("protocol {0:?} is not supported")]
    UnsupportedProtocol(String),

    #[error("at least one backing service must be specified")]
    MissingBackingServices,

    #[error("backing service {service} has no Destination")]
    BackingServiceNotFound { service: String },

    #[error("backing service {service} has no applied TrafficPolicy with outlier detection")]
    MissingOutlierDetection { service: String },

    #[error("mesh {mesh} is not grouped into a VirtualMesh")]
    MeshWithoutVirtualMesh { mesh: String },

    #[error("meshes belong to different VirtualMeshes: {}", virtual_meshes.join(", "))]
    ConflictingVirtualMeshes { virtual_meshes: Vec<String> },

    #[error("mesh {mesh} is already claimed by VirtualMesh {blocking}")]
    Conflict { mesh: String, blocking: String },
}

impl ValidationError {
    pub fn reference(kind: &'static str, reference: impl ToString) -> Self {
        ValidationError::Reference {
            kind,
            reference: reference.to_string(),
        }
    }
}
