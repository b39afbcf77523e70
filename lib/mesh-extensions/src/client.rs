//! Patch and push flows against the configured extension servers

use crate::options::DialOptions;
use crate::outputs::OutputSet;
use crate::pb::extensions::v1::networking_extensions_client::NetworkingExtensionsClient;
use crate::pb::extensions::v1::{
    ExtensionInputs, ExtensionPatchRequest, ExtensionPatchResponse, PushNotification,
    PushNotificationRequest,
};
use crate::{ExtensionError, Result};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tonic::Status;
use tracing::{debug, info, warn};

/// Default wait before re-opening a failed push stream
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Invoked for every push notification received from any server
pub type PushCallback = Arc<dyn Fn() + Send + Sync>;

pub type PushStream = BoxStream<'static, std::result::Result<PushNotification, Status>>;

/// One extension server
#[async_trait::async_trait]
pub trait ExtensionServer: Send + Sync {
    /// Address used in logs and errors
    fn address(&self) -> &str;

    async fn get_extension_patches(
        &self,
        request: ExtensionPatchRequest,
    ) -> std::result::Result<ExtensionPatchResponse, Status>;

    async fn watch_push_notifications(&self) -> std::result::Result<PushStream, Status>;
}

/// Extension server reached over gRPC
#[derive(Clone, Debug)]
pub struct GrpcExtensionServer {
    address: String,
    client: NetworkingExtensionsClient<Channel>,
}

impl GrpcExtensionServer {
    pub async fn connect(options: &DialOptions) -> Result<Self> {
        let channel = options.dial().await?;
        Ok(Self {
            address: options.address.clone(),
            client: NetworkingExtensionsClient::new(channel),
        })
    }
}

#[async_trait::async_trait]
impl ExtensionServer for GrpcExtensionServer {
    fn address(&self) -> &str {
        &self.address
    }

    async fn get_extension_patches(
        &self,
        request: ExtensionPatchRequest,
    ) -> std::result::Result<ExtensionPatchResponse, Status> {
        let mut client = self.client.clone();
        let response = client.get_extension_patches(request).await?;
        Ok(response.into_inner())
    }

    async fn watch_push_notifications(&self) -> std::result::Result<PushStream, Status> {
        let mut client = self.client.clone();
        let response = client
            .watch_push_notifications(PushNotificationRequest {})
            .await?;
        Ok(response.into_inner().boxed())
    }
}

/// All configured extension servers
#[derive(Clone)]
pub struct ExtensionClients {
    servers: Vec<Arc<dyn ExtensionServer>>,
    reconnect_delay: Duration,
}

impl ExtensionClients {
    pub fn new(servers: Vec<Arc<dyn ExtensionServer>>) -> Self {
        Self {
            servers,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Dial every server in order
    pub async fn connect(options: &[DialOptions]) -> Result<Self> {
        let mut servers: Vec<Arc<dyn ExtensionServer>> = Vec::with_capacity(options.len());
        for option in options {
            servers.push(Arc::new(GrpcExtensionServer::connect(option).await?));
        }
        info!("Connected to {} extension servers", servers.len());
        Ok(Self::new(servers))
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Let every server patch the outputs, in configuration order.
    /// Stops at the first server that fails.
    pub async fn patch_outputs(&self, inputs: &ExtensionInputs, outputs: &mut OutputSet) -> Result<()> {
        for server in &self.servers {
            let request = ExtensionPatchRequest {
                inputs: Some(inputs.clone()),
                generated_objects: outputs.to_objects(),
            };
            let response = server
                .get_extension_patches(request)
                .await
                .map_err(|status| ExtensionError::Patch {
                    address: server.address().to_string(),
                    status,
                })?;
            let merged = outputs.merge(response.patched_objects)?;
            debug!(address = server.address(), merged, "Applied extension patches");
        }
        Ok(())
    }

    /// Start one watch task per server. Each task calls `on_push` for every
    /// notification and re-opens its stream whenever it fails or ends, until
    /// `cancel` fires.
    pub fn watch_push_notifications(
        &self,
        cancel: CancellationToken,
        on_push: PushCallback,
    ) -> Vec<JoinHandle<()>> {
        self.servers
            .iter()
            .map(|server| {
                tokio::spawn(watch_server(
                    server.clone(),
                    cancel.clone(),
                    on_push.clone(),
                    self.reconnect_delay,
                ))
            })
            .collect()
    }
}

async fn watch_server(
    server: Arc<dyn ExtensionServer>,
    cancel: CancellationToken,
    on_push: PushCallback,
    reconnect_delay: Duration,
) {
    let address = server.address().to_string();
    loop {
        let opened = tokio::select! {
            _ = cancel.cancelled() => break,
            opened = server.watch_push_notifications() => opened,
        };

        match opened {
            Ok(mut stream) => {
                debug!(address = %address, "Watching push notifications");
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(address = %address, "Push watch cancelled");
                            return;
                        }
                        message = stream.next() => match message {
                            Some(Ok(_)) => {
                                debug!(address = %address, "Push notification received");
                                on_push();
                            }
                            Some(Err(status)) => {
                                warn!(address = %address, "Push stream failed, reconnecting: {}", status);
                                break;
                            }
                            None => {
                                warn!(address = %address, "Push stream closed, reconnecting");
                                break;
                            }
                        },
                    }
                }
            }
            Err(status) => {
                warn!(address = %address, "Failed to open push stream: {}", status);
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
    debug!(address = %address, "Push watch cancelled");
}
