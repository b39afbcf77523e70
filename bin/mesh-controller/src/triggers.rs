//! Sources that wake the approval loop

use futures::{StreamExt, TryStreamExt};
use kube::{Api, Client, Resource};
use kube_runtime::watcher;
use mesh_api::{
    AccessPolicy, Destination, FailoverService, KubernetesCluster, Mesh, Settings, TrafficPolicy,
    VirtualMesh, Workload,
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Watch every kind the approval pass reads and notify on each change
pub fn spawn_watchers(
    client: &Client,
    notify: Arc<Notify>,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    vec![
        spawn_watcher::<Mesh>(client, notify.clone(), cancel.clone()),
        spawn_watcher::<Destination>(client, notify.clone(), cancel.clone()),
        spawn_watcher::<Workload>(client, notify.clone(), cancel.clone()),
        spawn_watcher::<TrafficPolicy>(client, notify.clone(), cancel.clone()),
        spawn_watcher::<AccessPolicy>(client, notify.clone(), cancel.clone()),
        spawn_watcher::<VirtualMesh>(client, notify.clone(), cancel.clone()),
        spawn_watcher::<FailoverService>(client, notify.clone(), cancel.clone()),
        spawn_watcher::<KubernetesCluster>(client, notify.clone(), cancel.clone()),
        spawn_watcher::<Settings>(client, notify, cancel),
    ]
}

fn spawn_watcher<K>(client: &Client, notify: Arc<Notify>, cancel: CancellationToken) -> JoinHandle<()>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + 'static,
{
    let api: Api<K> = Api::all(client.clone());
    tokio::spawn(async move {
        let kind = K::kind(&()).into_owned();
        // The watcher retries internally; errors surface here only for logging
        let mut stream = watcher::watcher(api, watcher::Config::default())
            .map_err(|err| err.to_string())
            .boxed();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = stream.next() => match event {
                    Some(Ok(watcher::Event::InitApply(_))) => {}
                    Some(Ok(_)) => {
                        debug!(kind = %kind, "Watch event, scheduling approval");
                        notify.notify_one();
                    }
                    Some(Err(err)) => {
                        warn!(kind = %kind, "Watch error: {}", err);
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                    None => break,
                },
            }
        }
        debug!(kind = %kind, "Watcher stopped");
    })
}

/// Push callback that schedules an approval pass
pub fn push_trigger(notify: Arc<Notify>) -> mesh_extensions::PushCallback {
    Arc::new(move || notify.notify_one())
}
