//! Semantic validation of FailoverServices
//!
//! Every rule is evaluated and all failures are returned together. The
//! federation and outlier detection rules read the applied state recorded on
//! mesh and destination status, so the result depends on which policies are
//! currently applied.

use crate::ValidationError;
use mesh_api::networking::failover_service::FailoverPort;
use mesh_api::networking::FailoverServiceSpec;
use mesh_api::ClusterObjectRef;
use mesh_core::Snapshot;
use std::collections::BTreeSet;

/// Protocols a failover port may carry
pub const SUPPORTED_PROTOCOLS: &[&str] = &["HTTP", "HTTPS", "HTTP2", "GRPC", "TCP", "TLS", "MONGO"];

const MAX_SUBDOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// Validate a FailoverService against the snapshot's applied state
pub fn validate_failover_service(spec: &FailoverServiceSpec, snapshot: &Snapshot) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_hostname(&spec.hostname, snapshot.failover_hostname_suffix(), &mut errors);
    validate_port(spec.port.as_ref(), &mut errors);
    let backing_meshes = validate_backing_services(spec, snapshot, &mut errors);
    validate_federation(&spec.meshes, backing_meshes, snapshot, &mut errors);
    errors
}

fn validate_hostname(hostname: &str, suffix: &str, errors: &mut Vec<ValidationError>) {
    if let Some(reason) = dns1123_subdomain_violation(hostname) {
        errors.push(ValidationError::InvalidHostname {
            hostname: hostname.to_string(),
            reason,
        });
    }
    if !hostname.ends_with(suffix) {
        errors.push(ValidationError::MissingHostnameSuffix {
            hostname: hostname.to_string(),
            suffix: suffix.to_string(),
        });
    }
}

/// Why `value` is not a DNS-1123 subdomain, if it is not one
pub fn dns1123_subdomain_violation(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("must be non-empty".to_string());
    }
    if value.len() > MAX_SUBDOMAIN_LENGTH {
        return Some(format!("must be no more than {} characters", MAX_SUBDOMAIN_LENGTH));
    }

    for label in value.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
            return Some(format!(
                "each label must be 1-{} characters",
                MAX_LABEL_LENGTH
            ));
        }
        let valid_chars = label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        let bytes = label.as_bytes();
        let alphanumeric_edges = bytes[0].is_ascii_alphanumeric()
            && bytes[bytes.len() - 1].is_ascii_alphanumeric();
        if !valid_chars || !alphanumeric_edges {
            return Some(
                "must consist of lower case alphanumeric characters, '-' or '.', \
                 and must start and end with an alphanumeric character"
                    .to_string(),
            );
        }
    }
    None
}

fn validate_port(port: Option<&FailoverPort>, errors: &mut Vec<ValidationError>) {
    let Some(port) = port else {
        errors.push(ValidationError::MissingPort);
        return;
    };

    if port.number == 0 || port.number > u32::from(u16::MAX) {
        errors.push(ValidationError::InvalidPort(port.number));
    }
    if !SUPPORTED_PROTOCOLS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(&port.protocol))
    {
        errors.push(ValidationError::UnsupportedProtocol(port.protocol.clone()));
    }
}

/// Checks backing services and returns the meshes owning them
fn validate_backing_services(
    spec: &FailoverServiceSpec,
    snapshot: &Snapshot,
    errors: &mut Vec<ValidationError>,
) -> Vec<ClusterObjectRef> {
    if spec.backing_services.is_empty() {
        errors.push(ValidationError::MissingBackingServices);
        return Vec::new();
    }

    let mut meshes = Vec::new();
    for backing in &spec.backing_services {
        let service = &backing.kube_service;
        let Some(destination) = snapshot.destination_for_service(service) else {
            errors.push(ValidationError::BackingServiceNotFound {
                service: service.key(),
            });
            continue;
        };

        let has_outlier_detection = destination
            .applied_traffic_policies()
            .iter()
            .any(|applied| applied.spec.outlier_detection.is_some());
        if !has_outlier_detection {
            errors.push(ValidationError::MissingOutlierDetection {
                service: service.key(),
            });
        }

        if let Some(mesh) = &destination.spec.mesh {
            meshes.push(mesh.clone());
        }
    }
    meshes
}

fn validate_federation(
    declared: &[ClusterObjectRef],
    backing_meshes: Vec<ClusterObjectRef>,
    snapshot: &Snapshot,
    errors: &mut Vec<ValidationError>,
) {
    let meshes: BTreeSet<ClusterObjectRef> = declared.iter().cloned().chain(backing_meshes).collect();
    if meshes.len() < 2 {
        return;
    }

    let mut parents = BTreeSet::new();
    for mesh_ref in &meshes {
        // Unknown meshes are reported by reference validation
        let Ok(mesh) = snapshot.meshes.find(mesh_ref) else {
            continue;
        };
        let parent = mesh
            .status
            .as_ref()
            .and_then(|status| status.applied_virtual_mesh.as_ref());
        match parent {
            Some(applied) => {
                parents.insert(applied.reference.key());
            }
            None => errors.push(ValidationError::MeshWithoutVirtualMesh {
                mesh: mesh_ref.key(),
            }),
        }
    }

    if parents.len() > 1 {
        errors.push(ValidationError::ConflictingVirtualMeshes {
            virtual_meshes: parents.into_iter().collect(),
        });
    }
}
