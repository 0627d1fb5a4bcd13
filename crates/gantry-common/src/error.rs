//! Error types for the gantry engine
//!
//! Errors are structured with fields to aid debugging in production.
//! Each variant carries contextual information such as cluster names,
//! offending values, and the accepted options the provider advertises.

use std::time::Duration;

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for gantry operations
#[derive(Debug, Error)]
pub enum Error {
    /// Capability catalog could not be fetched
    ///
    /// Non-fatal by policy: reconciliation degrades to skipping catalog
    /// validation and lets the provisioning service be the final authority.
    #[error("capability catalog unavailable for project {project}: {message}")]
    CatalogUnavailable {
        /// Project whose catalog was requested
        project: String,
        /// Description of what failed
        message: String,
    },

    /// Specification failed validation against the capability catalog
    #[error("validation error for {cluster} [{field}]: {message}")]
    Validation {
        /// Name of the cluster with the invalid configuration
        cluster: String,
        /// The invalid field path (e.g. "nodePools[pool-1].machineType")
        field: String,
        /// The rejected value
        value: String,
        /// Full set of values the provider accepts for this field
        accepted: Vec<String>,
        /// Description of what's invalid, including the accepted set
        message: String,
    },

    /// No supported version satisfies the requested constraint
    #[error("no supported version matches {requested} (candidates: {})", .candidates.join(", "))]
    NoMatchingVersion {
        /// The version expression the caller asked for
        requested: String,
        /// All catalog versions considered, with lifecycle annotations
        candidates: Vec<String>,
    },

    /// Provisioning service request failed
    #[error("provider error during {operation} for {cluster}: {message}")]
    Provider {
        /// Name of the cluster the request was about
        cluster: String,
        /// The operation that failed (e.g. "get_cluster")
        operation: String,
        /// HTTP status code when the service answered at all
        status: Option<u16>,
        /// Description of what failed
        message: String,
        /// Whether the caller may safely retry the whole invocation
        transient: bool,
    },

    /// Polling exceeded the caller-supplied budget
    ///
    /// The remote operation keeps running server-side; a later invocation
    /// can resume by re-reading state.
    #[error("timed out during {operation} for {cluster} after {waited_secs}s")]
    TimedOut {
        /// Name of the cluster being polled
        cluster: String,
        /// The operation that was being awaited (e.g. "stabilization")
        operation: String,
        /// How long polling ran before giving up
        waited_secs: u64,
    },

    /// Polling was cancelled by the caller
    #[error("cancelled during {operation} for {cluster}")]
    Cancelled {
        /// Name of the cluster being polled
        cluster: String,
        /// The operation that was cancelled
        operation: String,
    },

    /// Cluster does not exist on the provisioning service
    ///
    /// A success signal during delete polling, a normal miss on read.
    #[error("cluster {cluster} not found in project {project}")]
    NotFound {
        /// Project the cluster was looked up in
        project: String,
        /// Name of the missing cluster
        cluster: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a catalog error for a project
    pub fn catalog_unavailable(project: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            project: project.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error with the given message
    ///
    /// For simple validation errors without cluster context.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: UNKNOWN_CONTEXT.to_string(),
            field: UNKNOWN_CONTEXT.to_string(),
            value: String::new(),
            accepted: Vec::new(),
            message: msg.into(),
        }
    }

    /// Create a validation error with cluster context
    pub fn validation_for(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            field: UNKNOWN_CONTEXT.to_string(),
            value: String::new(),
            accepted: Vec::new(),
            message: msg.into(),
        }
    }

    /// Create a validation error with cluster context and field path
    pub fn validation_for_field(
        cluster: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            field: field.into(),
            value: String::new(),
            accepted: Vec::new(),
            message: msg.into(),
        }
    }

    /// Create a validation error carrying the rejected value and the full
    /// accepted set, so the operator can self-correct without a second
    /// round trip
    pub fn validation_rejected(
        cluster: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
        accepted: Vec<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            field: field.into(),
            value: value.into(),
            accepted,
            message: msg.into(),
        }
    }

    /// Create a version-resolution error with the candidate list
    pub fn no_matching_version(requested: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::NoMatchingVersion {
            requested: requested.into(),
            candidates,
        }
    }

    /// Create a provider error with the given message
    ///
    /// For simple provider errors without full context. Transient by default.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            cluster: UNKNOWN_CONTEXT.to_string(),
            operation: UNKNOWN_CONTEXT.to_string(),
            status: None,
            message: msg.into(),
            transient: true,
        }
    }

    /// Create a transient provider error with cluster and operation context
    pub fn provider_for(
        cluster: impl Into<String>,
        operation: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Provider {
            cluster: cluster.into(),
            operation: operation.into(),
            status: None,
            message: msg.into(),
            transient: true,
        }
    }

    /// Create a non-transient provider error (e.g. request rejected)
    pub fn provider_permanent(
        cluster: impl Into<String>,
        operation: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Provider {
            cluster: cluster.into(),
            operation: operation.into(),
            status: None,
            message: msg.into(),
            transient: false,
        }
    }

    /// Create a provider error from an HTTP status code
    pub fn provider_with_status(
        cluster: impl Into<String>,
        operation: impl Into<String>,
        status: u16,
        msg: impl Into<String>,
        transient: bool,
    ) -> Self {
        Self::Provider {
            cluster: cluster.into(),
            operation: operation.into(),
            status: Some(status),
            message: msg.into(),
            transient,
        }
    }

    /// Create a timeout error for an operation that ran `waited` long
    pub fn timed_out(
        cluster: impl Into<String>,
        operation: impl Into<String>,
        waited: Duration,
    ) -> Self {
        Self::TimedOut {
            cluster: cluster.into(),
            operation: operation.into(),
            waited_secs: waited.as_secs(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(cluster: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Cancelled {
            cluster: cluster.into(),
            operation: operation.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(project: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self::NotFound {
            project: project.into(),
            cluster: cluster.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Check if the caller may retry the whole invocation after this error
    ///
    /// Validation errors never are (they require a spec fix). Provider
    /// errors carry the classification the transport layer assigned
    /// (5xx/network transient, 4xx not). Timeouts are retryable because
    /// polling only reads state. Cancellation is deliberate and is not
    /// reclassified as retryable.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::CatalogUnavailable { .. } => true,
            Error::Validation { .. } => false,
            Error::NoMatchingVersion { .. } => false,
            Error::Provider { transient, .. } => *transient,
            Error::TimedOut { .. } => true,
            Error::Cancelled { .. } => false,
            Error::NotFound { .. } => false,
            Error::Serialization { .. } => false,
        }
    }

    /// Get the cluster name if this error is associated with a specific cluster
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Error::CatalogUnavailable { .. } => None,
            Error::Validation { cluster, .. } => Some(cluster),
            Error::NoMatchingVersion { .. } => None,
            Error::Provider { cluster, .. } => Some(cluster),
            Error::TimedOut { cluster, .. } => Some(cluster),
            Error::Cancelled { cluster, .. } => Some(cluster),
            Error::NotFound { cluster, .. } => Some(cluster),
            Error::Serialization { .. } => None,
        }
    }

    /// Get the accepted-options enumeration carried by validation errors
    pub fn accepted(&self) -> &[String] {
        match self {
            Error::Validation { accepted, .. } => accepted,
            Error::NoMatchingVersion { candidates, .. } => candidates,
            _ => &[],
        }
    }

    /// Check if this error is the not-found signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
