//! Generated objects exchanged with extension servers

use crate::pb::extensions::v1::{ExtensionInputs, GeneratedObject, ObjectMeta};
use crate::{ExtensionError, Result};
use mesh_api::ClusterObjectRef;
use mesh_core::{ResourceSet, Snapshot};
use std::collections::BTreeMap;

/// Generated configuration grouped by kind, each object keyed by identity
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputSet {
    objects: BTreeMap<String, BTreeMap<ClusterObjectRef, serde_json::Value>>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object, returning the previous one
    pub fn insert(
        &mut self,
        kind: impl Into<String>,
        identity: ClusterObjectRef,
        object: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.objects
            .entry(kind.into())
            .or_default()
            .insert(identity, object)
    }

    pub fn get(&self, kind: &str, identity: &ClusterObjectRef) -> Option<&serde_json::Value> {
        self.objects.get(kind).and_then(|objects| objects.get(identity))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Total number of objects
    pub fn len(&self) -> usize {
        self.objects.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_objects(&self) -> Vec<GeneratedObject> {
        self.objects
            .iter()
            .flat_map(|(kind, objects)| {
                objects
                    .iter()
                    .map(move |(identity, object)| generated_object(kind, identity, object.to_string()))
            })
            .collect()
    }

    /// Merge patched objects by kind and identity, returning how many were merged
    pub fn merge(&mut self, patched: Vec<GeneratedObject>) -> Result<usize> {
        let mut merged = 0;
        for object in patched {
            let identity = object
                .metadata
                .as_ref()
                .map(identity_of)
                .unwrap_or_default();
            let value = serde_json::from_str(&object.json).map_err(|source| {
                ExtensionError::InvalidObject {
                    kind: object.kind.clone(),
                    name: identity.key(),
                    source,
                }
            })?;
            self.insert(object.kind, identity, value);
            merged += 1;
        }
        Ok(merged)
    }
}

fn identity_of(meta: &ObjectMeta) -> ClusterObjectRef {
    ClusterObjectRef {
        name: meta.name.clone(),
        namespace: meta.namespace.clone(),
        cluster_name: (!meta.cluster_name.is_empty()).then(|| meta.cluster_name.clone()),
    }
}

fn generated_object(kind: &str, identity: &ClusterObjectRef, json: String) -> GeneratedObject {
    GeneratedObject {
        kind: kind.to_string(),
        metadata: Some(ObjectMeta {
            name: identity.name.clone(),
            namespace: identity.namespace.clone(),
            cluster_name: identity.cluster_name.clone().unwrap_or_default(),
        }),
        json,
    }
}

fn serialize_set<K>(set: &ResourceSet<K>) -> Result<Vec<GeneratedObject>>
where
    K: kube::Resource<DynamicType = ()> + serde::Serialize,
{
    set.iter()
        .map(|object| {
            let identity = ClusterObjectRef::from_resource(object);
            let json = serde_json::to_string(object).map_err(|source| ExtensionError::InvalidObject {
                kind: set.kind().to_string(),
                name: identity.key(),
                source,
            })?;
            Ok(generated_object(set.kind(), &identity, json))
        })
        .collect()
}

/// Discovery state sent along with every patch request
pub fn inputs_from_snapshot(snapshot: &Snapshot) -> Result<ExtensionInputs> {
    Ok(ExtensionInputs {
        meshes: serialize_set(&snapshot.meshes)?,
        destinations: serialize_set(&snapshot.destinations)?,
        workloads: serialize_set(&snapshot.workloads)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_api::discovery::mesh::MeshSpec;
    use mesh_api::Mesh;
    use serde_json::json;

    fn sidecar(name: &str) -> ClusterObjectRef {
        ClusterObjectRef::in_cluster(name, "bookinfo", "east")
    }

    #[test]
    fn test_merge_replaces_by_identity_and_adds_new() {
        let mut outputs = OutputSet::new();
        outputs.insert("Sidecar", sidecar("reviews"), json!({"egress": []}));
        outputs.insert("Sidecar", sidecar("ratings"), json!({"egress": []}));

        let merged = outputs
            .merge(vec![
                generated_object("Sidecar", &sidecar("reviews"), r#"{"egress":["*/*"]}"#.to_string()),
                generated_object("EnvoyFilter", &sidecar("reviews"), "{}".to_string()),
            ])
            .unwrap();

        assert_eq!(merged, 2);
        assert_eq!(outputs.len(), 3);
        assert_eq!(
            outputs.get("Sidecar", &sidecar("reviews")),
            Some(&json!({"egress": ["*/*"]}))
        );
        assert_eq!(
            outputs.get("Sidecar", &sidecar("ratings")),
            Some(&json!({"egress": []}))
        );
        assert_eq!(outputs.kinds().collect::<Vec<_>>(), vec!["EnvoyFilter", "Sidecar"]);
    }

    #[test]
    fn test_merge_rejects_malformed_json() {
        let mut outputs = OutputSet::new();
        let err = outputs
            .merge(vec![generated_object("Sidecar", &sidecar("reviews"), "{".to_string())])
            .unwrap_err();
        assert!(matches!(err, ExtensionError::InvalidObject { ref kind, .. } if kind == "Sidecar"));
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_objects_keep_cluster_identity() {
        let mut outputs = OutputSet::new();
        outputs.insert("Sidecar", sidecar("reviews"), json!({}));
        outputs.insert("Sidecar", ClusterObjectRef::new("reviews", "bookinfo"), json!({}));

        let mut round_tripped = OutputSet::new();
        round_tripped.merge(outputs.to_objects()).unwrap();
        assert_eq!(round_tripped, outputs);
    }

    #[test]
    fn test_inputs_carry_discovery_state() {
        let mut snapshot = Snapshot::default();
        let mut mesh = Mesh::new("istio-east", MeshSpec::default());
        mesh.metadata.namespace = Some("mesh-system".to_string());
        snapshot.meshes.insert(mesh);

        let inputs = inputs_from_snapshot(&snapshot).unwrap();
        assert_eq!(inputs.meshes.len(), 1);
        assert!(inputs.destinations.is_empty());
        let object = &inputs.meshes[0];
        assert_eq!(object.kind, "Mesh");
        assert_eq!(object.metadata.as_ref().unwrap().name, "istio-east");
        let value: serde_json::Value = serde_json::from_str(&object.json).unwrap();
        assert_eq!(value["metadata"]["name"], "istio-east");
    }
}
