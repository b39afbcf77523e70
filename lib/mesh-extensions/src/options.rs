//! Connection options for extension servers

use crate::{ExtensionError, Result};
use mesh_api::settings::GrpcServer;
use std::time::Duration;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, warn};

/// Connection attempts made for the initial dial when retrying is enabled
pub const DIAL_ATTEMPTS: u32 = 10;

/// Wait between initial dial attempts
pub const DIAL_BACKOFF: Duration = Duration::from_secs(2);

/// How to reach one extension server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialOptions {
    /// host:port, optionally with an explicit scheme
    pub address: String,

    /// Connect without TLS
    pub insecure: bool,

    /// Retry the initial connection on transient failures
    pub reconnect_on_network_failures: bool,
}

impl From<&GrpcServer> for DialOptions {
    fn from(server: &GrpcServer) -> Self {
        Self {
            address: server.address.clone(),
            insecure: server.insecure,
            reconnect_on_network_failures: server.reconnect_on_network_failures,
        }
    }
}

impl DialOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            insecure: false,
            reconnect_on_network_failures: false,
        }
    }

    /// URI dialed for this server
    pub fn uri(&self) -> String {
        if self.address.contains("://") {
            return self.address.clone();
        }
        let scheme = if self.insecure { "http" } else { "https" };
        format!("{}://{}", scheme, self.address)
    }

    pub fn endpoint(&self) -> Result<Endpoint> {
        let invalid = |source| ExtensionError::InvalidAddress {
            address: self.address.clone(),
            source,
        };

        let endpoint = Endpoint::from_shared(self.uri()).map_err(invalid)?;
        if self.insecure {
            return Ok(endpoint);
        }
        endpoint
            .tls_config(ClientTlsConfig::new().with_webpki_roots())
            .map_err(invalid)
    }

    /// Open a channel, retrying with a fixed backoff when enabled.
    /// Only the initial connection is retried here.
    pub async fn dial(&self) -> Result<Channel> {
        let endpoint = self.endpoint()?;
        let attempts = if self.reconnect_on_network_failures {
            DIAL_ATTEMPTS
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            match endpoint.connect().await {
                Ok(channel) => {
                    debug!(address = %self.address, attempt, "Connected to extension server");
                    return Ok(channel);
                }
                Err(err) if attempt < attempts => {
                    warn!(
                        address = %self.address,
                        attempt,
                        "Extension server unavailable, retrying in {:?}: {}",
                        DIAL_BACKOFF,
                        err
                    );
                    tokio::time::sleep(DIAL_BACKOFF).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(ExtensionError::Connect {
                        address: self.address.clone(),
                        source,
                    })
                }
            }
        }
    }
}
