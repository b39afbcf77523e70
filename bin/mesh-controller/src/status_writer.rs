//! Writes changed status subresources back to the API server

use anyhow::{Context, Result};
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use mesh_core::{ResourceSet, Snapshot};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Debug;
use tracing::{debug, info};

pub struct StatusWriter {
    client: Client,
    dry_run: bool,
}

impl StatusWriter {
    pub fn new(client: Client, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// Patch every object whose status differs between the two snapshots.
    /// Returns the number of changed objects.
    pub async fn write(&self, before: &Snapshot, after: &Snapshot) -> Result<usize> {
        let mut changed = 0;
        changed += self.write_set(&before.destinations, &after.destinations).await?;
        changed += self.write_set(&before.meshes, &after.meshes).await?;
        changed += self
            .write_set(&before.traffic_policies, &after.traffic_policies)
            .await?;
        changed += self
            .write_set(&before.access_policies, &after.access_policies)
            .await?;
        changed += self
            .write_set(&before.virtual_meshes, &after.virtual_meshes)
            .await?;
        changed += self
            .write_set(&before.failover_services, &after.failover_services)
            .await?;
        Ok(changed)
    }

    async fn write_set<K>(&self, before: &ResourceSet<K>, after: &ResourceSet<K>) -> Result<usize>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Serialize
            + Debug,
    {
        let mut changed = 0;
        for object in after.iter() {
            let reference = mesh_api::ClusterObjectRef::from_resource(object);
            let previous = before.find(&reference).ok().map(status_of).transpose()?;
            let Some(patch) = status_patch(previous.as_ref(), &status_of(object)?) else {
                continue;
            };
            changed += 1;

            if self.dry_run {
                info!(kind = %K::kind(&()), object = %reference.key(), "Dry run, status would change");
                continue;
            }

            let namespace = object.namespace().unwrap_or_default();
            let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
            api.patch_status(
                &object.name_any(),
                &PatchParams::default(),
                &Patch::Merge(&serde_json::json!({ "status": patch })),
            )
            .await
            .with_context(|| format!("failed to patch status of {} {}", K::kind(&()), reference.key()))?;
            debug!(kind = %K::kind(&()), object = %reference.key(), "Patched status");
        }
        Ok(changed)
    }
}

fn status_of<K: Serialize>(object: &K) -> Result<Value> {
    let mut value = serde_json::to_value(object).context("failed to serialize object")?;
    Ok(value
        .get_mut("status")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

/// JSON merge patch turning `before` into `after`, or None when they are equal
pub fn status_patch(before: Option<&Value>, after: &Value) -> Option<Value> {
    match before {
        Some(before) if before == after => None,
        Some(before) => Some(merge_diff(before, after)),
        None if after.is_null() => None,
        None => Some(after.clone()),
    }
}

fn merge_diff(before: &Value, after: &Value) -> Value {
    match (before, after) {
        (Value::Object(before), Value::Object(after)) => {
            let mut patch = Map::new();
            for (key, old) in before {
                match after.get(key) {
                    None => {
                        patch.insert(key.clone(), Value::Null);
                    }
                    Some(new) if new != old => {
                        patch.insert(key.clone(), merge_diff(old, new));
                    }
                    Some(_) => {}
                }
            }
            for (key, new) in after {
                if !before.contains_key(key) {
                    patch.insert(key.clone(), new.clone());
                }
            }
            Value::Object(patch)
        }
        _ => after.clone(),
    }
}
