//! Core control plane functionality shared by the approval engine and its callers
//!
//! This library provides:
//! - Snapshot of discovered and declared resources for one reconciliation pass
//! - Selector matching against destinations, workloads and identities
//! - Reporter through which translators flag policy/target incompatibilities
//! - The Translator seam

pub mod error;
pub mod reporter;
pub mod selector;
pub mod snapshot;
pub mod translator;

pub use error::{CoreError, Result};
pub use reporter::{ApprovalReporter, Reporter};
pub use snapshot::{ResourceSet, Snapshot};
pub use translator::{NoopTranslator, Translator};
