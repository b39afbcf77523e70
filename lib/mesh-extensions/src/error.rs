use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtensionError>;

#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("invalid extension server address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("failed to connect to extension server {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("extension server {address} failed to patch outputs: {status}")]
    Patch {
        address: String,
        status: tonic::Status,
    },

    #[error("invalid {kind} object {name}: {source}")]
    InvalidObject {
        kind: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
