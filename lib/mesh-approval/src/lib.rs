//! Policy approval and conflict resolution
//!
//! One synchronous pass over a [`mesh_core::Snapshot`] decides which declared
//! policies are valid, which of them apply to which destinations and meshes,
//! and in which stable order. Results are written onto status fields only.

pub mod approver;
pub mod error;
pub mod failover;
pub mod ordering;
pub mod references;
pub mod virtual_mesh;

#[cfg(test)]
mod fixtures;

pub use approver::Approver;
pub use error::ValidationError;
pub use failover::validate_failover_service;
pub use ordering::{AcceptanceKey, ApprovablePolicy};
pub use references::{validate_references, ReferenceErrors};
pub use virtual_mesh::{resolve_mesh_claims, MeshClaims};
