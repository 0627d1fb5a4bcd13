//! Reconciliation engine for managed Kubernetes clusters
//!
//! Drives a desired [`gantry_common::model::ClusterSpec`] to reality on
//! the provisioning service:
//!
//! 1. fetch the project's capability catalog (degrading gracefully when
//!    it is unavailable)
//! 2. resolve the requested Kubernetes version against the catalog
//! 3. normalize node pools by filling unset fields from a default policy
//! 4. validate the normalized spec against the catalog, enumerating the
//!    accepted options on first failure
//! 5. submit the wire payload, then poll until the cluster stabilizes
//! 6. re-read the final state, attaching credentials once stable
//!
//! The engine never retries writes; only reads go through backoff.

pub mod catalog;
pub mod client;
pub mod defaults;
pub mod diff;
pub mod reconcile;
pub mod transform;
pub mod validate;
pub mod version;

// Re-export the main entry points
pub use client::ProvisionerClient;
pub use defaults::DefaultPolicy;
pub use reconcile::{PollConfig, ReconcileIntent, Reconciler};
