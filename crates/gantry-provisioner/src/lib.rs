//! Client for the cluster provisioning service
//!
//! Speaks the service's REST API: the capability catalog per project,
//! cluster upsert/read/delete, and credential retrieval. The wire types
//! in [`wire`] mirror the service's JSON payloads exactly; translation
//! to and from the engine's domain model happens in the engine crate.

pub mod http;
pub mod wire;

// Re-export the concrete client and its configuration
pub use http::{HttpProvisionerClient, ProvisionerConfig};
