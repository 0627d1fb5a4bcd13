//! Desired-state specification for a managed Kubernetes cluster
//!
//! These types describe what the operator wants. They are independent of
//! the provisioning service's wire format and of anything the service
//! reports back (see [`crate::model::observed`] for the latter).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

fn default_true() -> bool {
    true
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Desired state of a managed Kubernetes cluster
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Cluster name, unique within the project
    pub name: String,

    /// Project the cluster belongs to
    pub project_id: String,

    /// Requested Kubernetes version, exact ("1.18.1") or partial ("1.18")
    pub kubernetes_version: String,

    /// Allow privileged containers in workloads
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_privileged_containers: bool,

    /// Worker node pools (at least one required)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_pools: Vec<NodePoolSpec>,

    /// Maintenance window and auto-update policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<MaintenanceWindow>,

    /// Recurring hibernation schedules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hibernation_schedules: Vec<HibernationSchedule>,

    /// Optional provider extensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}

impl ClusterSpec {
    /// Structural validation that needs no capability catalog
    ///
    /// Catalog-dependent checks (machine types, zones, versions) live in
    /// the engine; this only rejects specs that are malformed on their own.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("cluster name must not be empty"));
        }

        if self.project_id.is_empty() {
            return Err(Error::validation_for(
                &self.name,
                "projectId must not be empty",
            ));
        }

        if self.kubernetes_version.is_empty() {
            return Err(Error::validation_for_field(
                &self.name,
                "kubernetesVersion",
                "kubernetesVersion must not be empty",
            ));
        }

        if self.node_pools.is_empty() {
            return Err(Error::validation_for_field(
                &self.name,
                "nodePools",
                "at least one node pool is required",
            ));
        }

        let mut seen = BTreeSet::new();
        for pool in &self.node_pools {
            pool.validate(&self.name)?;
            if !seen.insert(pool.name.as_str()) {
                return Err(Error::validation_for_field(
                    &self.name,
                    format!("nodePools[{}]", pool.name),
                    format!("duplicate node pool name '{}'", pool.name),
                ));
            }
        }

        Ok(())
    }
}

/// Desired state of a worker node pool
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    /// Pool name, unique within the cluster
    pub name: String,

    /// Machine type for pool nodes (e.g. "c1.2")
    pub machine_type: String,

    /// Worker OS image; unset parts are filled by policy and catalog
    #[serde(default)]
    pub machine_image: MachineImage,

    /// Minimum number of nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,

    /// Maximum number of nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,

    /// Nodes that may be created above maximum during a rolling update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<u32>,

    /// Nodes that may be unavailable during a rolling update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<u32>,

    /// Volume type backing node disks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,

    /// Node disk size in gigabytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_size_gb: Option<u32>,

    /// Container runtime (e.g. "containerd")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_runtime: Option<String>,

    /// Labels applied to pool nodes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Taints applied to pool nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,

    /// Availability zones nodes are spread across
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,
}

impl NodePoolSpec {
    /// Structural validation for a single pool
    pub fn validate(&self, cluster: &str) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation_for_field(
                cluster,
                "nodePools",
                "node pool name must not be empty",
            ));
        }

        if self.machine_type.is_empty() {
            return Err(Error::validation_for_field(
                cluster,
                format!("nodePools[{}].machineType", self.name),
                "machineType must not be empty",
            ));
        }

        if let (Some(min), Some(max)) = (self.min_count, self.max_count) {
            if min > max {
                return Err(Error::validation_for_field(
                    cluster,
                    format!("nodePools[{}].minCount", self.name),
                    format!("minCount {} exceeds maxCount {}", min, max),
                ));
            }
        }

        for taint in &self.taints {
            if taint.key.is_empty() {
                return Err(Error::validation_for_field(
                    cluster,
                    format!("nodePools[{}].taints", self.name),
                    "taint key must not be empty",
                ));
            }
        }

        Ok(())
    }
}

/// Worker OS image selection for a node pool
///
/// Both parts are optional in the desired spec: an unset name is filled
/// from the default policy, an unset version is resolved against the
/// capability catalog.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineImage {
    /// Image name (e.g. "flatcar")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Image version (e.g. "3815.2.0")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Taint applied to nodes in a pool
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Taint {
    /// Taint key
    pub key: String,

    /// Optional taint value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Effect on pods that do not tolerate the taint
    #[serde(default)]
    pub effect: TaintEffect,
}

/// Effect of a node taint on pod scheduling
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum TaintEffect {
    /// New pods without a matching toleration are not scheduled
    #[default]
    NoSchedule,
    /// Scheduler tries to avoid placing pods without a toleration
    PreferNoSchedule,
    /// Running pods without a toleration are evicted
    NoExecute,
}

impl fmt::Display for TaintEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaintEffect::NoSchedule => "NoSchedule",
            TaintEffect::PreferNoSchedule => "PreferNoSchedule",
            TaintEffect::NoExecute => "NoExecute",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TaintEffect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "noschedule" => Ok(TaintEffect::NoSchedule),
            "prefernoschedule" => Ok(TaintEffect::PreferNoSchedule),
            "noexecute" => Ok(TaintEffect::NoExecute),
            _ => Err(Error::validation(format!(
                "unknown taint effect '{}', expected one of: NoSchedule, PreferNoSchedule, NoExecute",
                s
            ))),
        }
    }
}

/// Maintenance window and auto-update policy
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindow {
    /// Automatically roll out Kubernetes patch updates
    #[serde(default = "default_true")]
    pub kubernetes_version_updates: bool,

    /// Automatically roll out machine image updates
    #[serde(default = "default_true")]
    pub machine_image_updates: bool,

    /// Window start, time of day with offset (e.g. "01:00:00Z")
    pub start: String,

    /// Window end
    pub end: String,
}

/// Recurring hibernation schedule
///
/// Start and end are cron expressions; the cluster scales to zero
/// between them.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HibernationSchedule {
    /// Cron expression for entering hibernation
    pub start: String,

    /// Cron expression for waking up
    pub end: String,

    /// IANA timezone the expressions are evaluated in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Optional provider extensions
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extensions {
    /// Observability integration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityExtension>,

    /// API server access control list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<AclExtension>,
}

impl Extensions {
    /// True when at least one extension is present
    pub fn is_configured(&self) -> bool {
        self.observability.is_some() || self.acl.is_some()
    }
}

/// Ships cluster logs and metrics to an observability instance
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservabilityExtension {
    /// Whether the integration is active
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Target observability instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

/// Restricts API server access to an allow-list of CIDR ranges
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AclExtension {
    /// Whether the allow-list is enforced
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// CIDR ranges allowed to reach the API server
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_cidrs: Vec<String>,
}
