//! Client side of the networking extension protocol
//!
//! Extension servers may patch the configuration the control plane generates
//! (`GetExtensionPatches`) and ask it to reconcile again by pushing
//! notifications (`WatchPushNotifications`).

pub mod client;
pub mod error;
pub mod options;
pub mod outputs;
pub mod pb;

pub use client::{ExtensionClients, ExtensionServer, GrpcExtensionServer, PushCallback};
pub use error::{ExtensionError, Result};
pub use options::DialOptions;
pub use outputs::{inputs_from_snapshot, OutputSet};
