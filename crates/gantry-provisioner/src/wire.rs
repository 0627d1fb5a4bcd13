//! Wire types mirroring the provisioning service's JSON payloads
//!
//! These structs are shaped by the service, not by us: nested `machine`
//! and `volume` objects, a `nodepools` array, and optional blocks that
//! must be omitted entirely (not sent as `null` or `{}`) when unused.
//! Keep them free of behavior; translation lives in the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gantry_common::model::TaintEffect;

/// Full cluster payload as sent to and returned by the service
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCluster {
    pub name: String,

    #[serde(default)]
    pub kubernetes: WireKubernetes,

    #[serde(default)]
    pub nodepools: Vec<WireNodePool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<WireMaintenance>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hibernations: Option<Vec<WireHibernation>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<WireExtensions>,

    /// Server-populated; never sent on writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WireStatus>,
}

/// Control plane block
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireKubernetes {
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_privileged_containers: Option<bool>,
}

/// Worker pool block
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNodePool {
    pub name: String,

    #[serde(default)]
    pub machine: WireMachine,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<WireVolume>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cri: Option<WireCri>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taints: Option<Vec<WireTaint>>,

    #[serde(default)]
    pub availability_zones: Vec<String>,
}

/// Machine type and OS image for a pool
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMachine {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default)]
    pub image: WireImage,
}

/// OS image reference
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Node disk configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVolume {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// Container runtime selection
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCri {
    pub name: String,
}

/// Node taint
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTaint {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default)]
    pub effect: TaintEffect,
}

/// Maintenance block
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMaintenance {
    #[serde(default)]
    pub auto_update: WireAutoUpdate,

    #[serde(default)]
    pub time_window: WireTimeWindow,
}

/// Which update classes roll out automatically
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAutoUpdate {
    #[serde(default)]
    pub kubernetes_version: bool,

    #[serde(default)]
    pub machine_image_version: bool,
}

/// Daily window in which automatic updates may run
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTimeWindow {
    pub start: String,
    pub end: String,
}

/// One hibernation schedule entry
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHibernation {
    pub start: String,
    pub end: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Extensions block
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability: Option<WireObservability>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<WireAcl>,
}

/// Observability extension
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireObservability {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

/// ACL extension
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAcl {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub allowed_cidrs: Vec<String>,
}

/// Server-reported status
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStatus {
    /// Aggregated health string (e.g. "STATE_HEALTHY")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregated: Option<String>,

    /// Kubernetes version actually in use, which may trail the
    /// requested one during an upgrade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireStatusError>,
}

/// Detail accompanying a degraded or failed status
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStatusError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Credentials payload returned by the credentials endpoint
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCredentials {
    pub kubeconfig: String,
}
