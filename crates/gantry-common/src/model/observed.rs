//! Observed-state types reported back by the provisioning service

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::cluster::{Extensions, HibernationSchedule, MaintenanceWindow, NodePoolSpec};

/// Aggregated health of a cluster as reported by the provider
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterHealth {
    /// Provider reported no state, or one this engine does not know
    #[default]
    Unspecified,
    /// Initial provisioning in progress
    Creating,
    /// Converging toward the desired state
    Reconciling,
    /// Running and matching the desired state
    Healthy,
    /// Scaled to zero by a hibernation schedule
    Hibernated,
    /// Running but unhealthy; the provider keeps working on it
    Degraded,
    /// Provisioning failed; will not converge without intervention
    Error,
    /// Deletion in progress
    Deleting,
}

impl ClusterHealth {
    /// Parse the provider's aggregated status string
    ///
    /// Accepts both prefixed ("STATE_HEALTHY") and bare ("healthy") forms.
    /// Unknown strings map to [`ClusterHealth::Unspecified`] so that new
    /// provider states degrade to continued polling instead of a decode
    /// failure.
    pub fn from_wire(s: &str) -> ClusterHealth {
        let normalized = s.trim();
        let normalized = normalized.strip_prefix("STATE_").unwrap_or(normalized);
        match normalized.to_lowercase().as_str() {
            "creating" => ClusterHealth::Creating,
            "reconciling" | "reconcile" => ClusterHealth::Reconciling,
            "healthy" => ClusterHealth::Healthy,
            "hibernated" => ClusterHealth::Hibernated,
            "hibernating" | "wakingup" | "waking_up" => ClusterHealth::Reconciling,
            "unhealthy" | "degraded" => ClusterHealth::Degraded,
            "failed" | "error" => ClusterHealth::Error,
            "deleting" | "terminating" => ClusterHealth::Deleting,
            _ => ClusterHealth::Unspecified,
        }
    }

    /// Whether the cluster has settled into a state polling can stop on
    pub fn is_stable(&self) -> bool {
        matches!(self, ClusterHealth::Healthy | ClusterHealth::Hibernated)
    }

    /// Whether the provider gave up on converging
    pub fn is_failed(&self) -> bool {
        matches!(self, ClusterHealth::Error)
    }

    /// Whether polling should stop, successfully or not
    pub fn is_terminal(&self) -> bool {
        self.is_stable() || self.is_failed()
    }
}

impl fmt::Display for ClusterHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClusterHealth::Unspecified => "unspecified",
            ClusterHealth::Creating => "creating",
            ClusterHealth::Reconciling => "reconciling",
            ClusterHealth::Healthy => "healthy",
            ClusterHealth::Hibernated => "hibernated",
            ClusterHealth::Degraded => "degraded",
            ClusterHealth::Error => "error",
            ClusterHealth::Deleting => "deleting",
        };
        write!(f, "{}", s)
    }
}

/// Admin kubeconfig for a cluster
///
/// The payload is deliberately private and never appears in Debug output.
/// Serialization keeps it intact so observed state can be persisted.
#[derive(Clone, Deserialize, PartialEq, Serialize)]
pub struct CredentialsBundle {
    kubeconfig: String,
}

impl CredentialsBundle {
    /// Wrap a kubeconfig payload
    pub fn new(kubeconfig: impl Into<String>) -> Self {
        Self {
            kubeconfig: kubeconfig.into(),
        }
    }

    /// Access the kubeconfig payload
    pub fn as_str(&self) -> &str {
        &self.kubeconfig
    }
}

impl fmt::Debug for CredentialsBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsBundle")
            .field("kubeconfig", &"[redacted]")
            .field("len", &self.kubeconfig.len())
            .finish()
    }
}

/// What the provisioning service reports about a cluster
///
/// Node pools mirror the desired-spec shape so desired and observed state
/// can be compared field by field.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedState {
    /// Cluster name
    pub name: String,

    /// Project the cluster belongs to
    pub project_id: String,

    /// Kubernetes version actually in use
    pub kubernetes_version: String,

    /// Aggregated provider health
    #[serde(default)]
    pub health: ClusterHealth,

    /// Whether privileged containers are allowed
    #[serde(default)]
    pub allow_privileged_containers: bool,

    /// Observed node pools, normalized to the spec shape
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_pools: Vec<NodePoolSpec>,

    /// Observed maintenance configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<MaintenanceWindow>,

    /// Observed hibernation schedules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hibernation_schedules: Vec<HibernationSchedule>,

    /// Observed extensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,

    /// Admin credentials, fetched only once the cluster is stable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsBundle>,

    /// Provider-supplied detail accompanying a degraded or failed state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl ObservedState {
    /// Whether the cluster has settled into a stable state
    pub fn is_stable(&self) -> bool {
        self.health.is_stable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_mapping() {
        assert_eq!(ClusterHealth::from_wire("STATE_HEALTHY"), ClusterHealth::Healthy);
        assert_eq!(ClusterHealth::from_wire("STATE_CREATING"), ClusterHealth::Creating);
        assert_eq!(
            ClusterHealth::from_wire("STATE_RECONCILING"),
            ClusterHealth::Reconciling
        );
        assert_eq!(
            ClusterHealth::from_wire("STATE_HIBERNATED"),
            ClusterHealth::Hibernated
        );
        assert_eq!(
            ClusterHealth::from_wire("STATE_HIBERNATING"),
            ClusterHealth::Reconciling
        );
        assert_eq!(
            ClusterHealth::from_wire("STATE_WAKINGUP"),
            ClusterHealth::Reconciling
        );
        assert_eq!(
            ClusterHealth::from_wire("STATE_UNHEALTHY"),
            ClusterHealth::Degraded
        );
        assert_eq!(ClusterHealth::from_wire("STATE_FAILED"), ClusterHealth::Error);
        assert_eq!(ClusterHealth::from_wire("STATE_DELETING"), ClusterHealth::Deleting);

        // Bare forms without the prefix
        assert_eq!(ClusterHealth::from_wire("healthy"), ClusterHealth::Healthy);
        assert_eq!(ClusterHealth::from_wire("Error"), ClusterHealth::Error);
    }

    #[test]
    fn test_from_wire_unknown_degrades_to_unspecified() {
        assert_eq!(
            ClusterHealth::from_wire("STATE_SOMETHING_NEW"),
            ClusterHealth::Unspecified
        );
        assert_eq!(ClusterHealth::from_wire(""), ClusterHealth::Unspecified);
        assert!(!ClusterHealth::Unspecified.is_terminal());
    }

    #[test]
    fn test_health_classification() {
        assert!(ClusterHealth::Healthy.is_stable());
        assert!(ClusterHealth::Hibernated.is_stable());
        assert!(!ClusterHealth::Degraded.is_stable());

        assert!(ClusterHealth::Error.is_failed());
        assert!(!ClusterHealth::Degraded.is_failed());

        assert!(ClusterHealth::Healthy.is_terminal());
        assert!(ClusterHealth::Error.is_terminal());
        assert!(!ClusterHealth::Creating.is_terminal());
        assert!(!ClusterHealth::Reconciling.is_terminal());
        assert!(!ClusterHealth::Deleting.is_terminal());
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsBundle::new("apiVersion: v1\nkind: Config\nsecret-token");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains("secret-token"));
        assert_eq!(creds.as_str(), "apiVersion: v1\nkind: Config\nsecret-token");
    }

    #[test]
    fn test_observed_state_debug_never_leaks_credentials() {
        let observed = ObservedState {
            name: "demo".to_string(),
            project_id: "p-1".to_string(),
            kubernetes_version: "1.18.1".to_string(),
            health: ClusterHealth::Healthy,
            credentials: Some(CredentialsBundle::new("secret-token")),
            ..Default::default()
        };
        let debug = format!("{:?}", observed);
        assert!(!debug.contains("secret-token"));
        assert!(observed.is_stable());
    }

    #[test]
    fn test_observed_state_round_trip_keeps_credentials() {
        let observed = ObservedState {
            name: "demo".to_string(),
            project_id: "p-1".to_string(),
            kubernetes_version: "1.18.1".to_string(),
            health: ClusterHealth::Hibernated,
            credentials: Some(CredentialsBundle::new("kubeconfig-payload")),
            status_message: None,
            ..Default::default()
        };

        let json = serde_json::to_string(&observed).unwrap();
        let back: ObservedState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, observed);
        assert_eq!(back.credentials.unwrap().as_str(), "kubeconfig-payload");
    }
}
