//! One VirtualMesh per Mesh
//!
//! Candidates are visited most established first. A VirtualMesh claims all of
//! its meshes only if none of them is claimed yet; otherwise it is rejected,
//! naming the VirtualMesh that blocks it, and claims nothing.

use crate::ordering::ApprovablePolicy;
use crate::ValidationError;
use mesh_api::{ClusterObjectRef, VirtualMesh};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Outcome of mesh claim resolution
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshClaims {
    // mesh key -> claiming VirtualMesh
    claims: BTreeMap<String, ClusterObjectRef>,
    // VirtualMesh key -> conflict errors
    conflicts: BTreeMap<String, Vec<ValidationError>>,
}

impl MeshClaims {
    /// VirtualMesh that owns the mesh, if any
    pub fn claimant(&self, mesh: &ClusterObjectRef) -> Option<&ClusterObjectRef> {
        self.claims.get(&mesh.key())
    }

    pub fn conflicts(&self) -> &BTreeMap<String, Vec<ValidationError>> {
        &self.conflicts
    }

    pub fn is_conflicted(&self, virtual_mesh: &ClusterObjectRef) -> bool {
        self.conflicts.contains_key(&virtual_mesh.key())
    }

    /// Number of claimed meshes
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

fn claim_rank(virtual_mesh: &VirtualMesh) -> u8 {
    match (virtual_mesh.is_accepted(), virtual_mesh.is_up_to_date()) {
        (true, true) => 0,
        (true, false) => 1,
        _ => 2,
    }
}

/// Resolve which VirtualMesh owns each mesh
pub fn resolve_mesh_claims<'a>(candidates: impl IntoIterator<Item = &'a VirtualMesh>) -> MeshClaims {
    let mut ordered: Vec<(u8, ClusterObjectRef, &VirtualMesh)> = candidates
        .into_iter()
        .map(|vm| (claim_rank(vm), ClusterObjectRef::from_resource(vm), vm))
        .collect();
    ordered.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    let mut result = MeshClaims::default();
    for (_, vm_ref, vm) in ordered {
        let meshes: BTreeSet<&ClusterObjectRef> = vm.spec.meshes.iter().collect();

        let blocked = vm.spec.meshes.iter().find_map(|mesh| {
            result
                .claims
                .get(&mesh.key())
                .map(|blocking| (mesh, blocking.clone()))
        });

        match blocked {
            Some((mesh, blocking)) => {
                debug!(
                    virtual_mesh = %vm_ref,
                    mesh = %mesh,
                    blocking = %blocking,
                    "VirtualMesh rejected, mesh already claimed"
                );
                result.conflicts.insert(
                    vm_ref.key(),
                    vec![ValidationError::Conflict {
                        mesh: mesh.key(),
                        blocking: blocking.key(),
                    }],
                );
            }
            None => {
                for mesh in meshes {
                    result.claims.insert(mesh.key(), vm_ref.clone());
                }
                debug!(virtual_mesh = %vm_ref, "VirtualMesh claimed its meshes");
            }
        }
    }
    result
}
