//! Capability catalog types
//!
//! The provisioning service advertises, per project, which Kubernetes
//! versions, machine images, machine types, volume types, and availability
//! zones it currently offers. The engine validates desired specs against
//! this catalog and enumerates it back to the operator on rejection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a catalog entry
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Generally available and selectable
    #[default]
    Supported,
    /// Still running but no longer selectable for new resolution
    Deprecated,
    /// Early access, not selected automatically
    Preview,
    /// State string this engine does not know yet
    #[serde(other)]
    Unknown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Supported => "supported",
            LifecycleState::Deprecated => "deprecated",
            LifecycleState::Preview => "preview",
            LifecycleState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A Kubernetes or machine image version the provider offers
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedVersion {
    /// Exact version string (e.g. "1.18.1")
    pub version: String,

    /// Lifecycle state; absent in older catalog payloads
    #[serde(default)]
    pub state: LifecycleState,

    /// When this version stops being offered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

impl SupportedVersion {
    /// Whether automatic resolution may pick this version
    pub fn is_supported(&self) -> bool {
        self.state == LifecycleState::Supported
    }

    /// Human-readable form with lifecycle annotation, for error messages
    pub fn describe(&self) -> String {
        match self.expiration_date {
            Some(exp) => format!(
                "{} ({}, expires {})",
                self.version,
                self.state,
                exp.format("%Y-%m-%d")
            ),
            None => format!("{} ({})", self.version, self.state),
        }
    }
}

/// A worker OS image with its offered versions
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedImage {
    /// Image name (e.g. "flatcar")
    pub name: String,

    /// Offered versions, in catalog order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<SupportedVersion>,
}

impl SupportedImage {
    /// First version in supported state, in catalog order
    pub fn first_supported(&self) -> Option<&SupportedVersion> {
        self.versions.iter().find(|v| v.is_supported())
    }

    /// All offered versions with lifecycle annotations
    pub fn describe_versions(&self) -> Vec<String> {
        self.versions.iter().map(|v| v.describe()).collect()
    }
}

/// A machine type the provider offers
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineTypeOption {
    /// Machine type name (e.g. "c1.2")
    pub name: String,

    /// Number of CPUs
    #[serde(default)]
    pub cpu: u32,

    /// Memory in gigabytes
    #[serde(default)]
    pub memory: u32,
}

impl MachineTypeOption {
    /// Human-readable form for error messages
    pub fn describe(&self) -> String {
        format!("{} ({} cpu, {} GB)", self.name, self.cpu, self.memory)
    }
}

/// A volume type the provider offers
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeTypeOption {
    /// Volume type name (e.g. "storage_premium_perf1")
    pub name: String,
}

/// An availability zone the provider offers
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneOption {
    /// Zone name (e.g. "eu01-1")
    pub name: String,
}

/// Everything the provider currently offers for a project
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
    /// Offered Kubernetes control plane versions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kubernetes_versions: Vec<SupportedVersion>,

    /// Offered worker OS images
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_images: Vec<SupportedImage>,

    /// Offered machine types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_types: Vec<MachineTypeOption>,

    /// Offered volume types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_types: Vec<VolumeTypeOption>,

    /// Offered availability zones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<ZoneOption>,
}

impl ProviderOptions {
    /// Look up an image by exact name
    pub fn find_image(&self, name: &str) -> Option<&SupportedImage> {
        self.machine_images.iter().find(|i| i.name == name)
    }

    /// Whether a machine type with this name is offered
    pub fn has_machine_type(&self, name: &str) -> bool {
        self.machine_types.iter().any(|t| t.name == name)
    }

    /// Whether a volume type with this name is offered
    pub fn has_volume_type(&self, name: &str) -> bool {
        self.volume_types.iter().any(|t| t.name == name)
    }

    /// Whether an availability zone with this name is offered
    pub fn has_zone(&self, name: &str) -> bool {
        self.availability_zones.iter().any(|z| z.name == name)
    }

    /// All offered cluster versions with lifecycle annotations
    pub fn describe_versions(&self) -> Vec<String> {
        self.kubernetes_versions.iter().map(|v| v.describe()).collect()
    }

    /// All offered image names
    pub fn describe_images(&self) -> Vec<String> {
        self.machine_images.iter().map(|i| i.name.clone()).collect()
    }

    /// All offered machine types with their shapes
    pub fn describe_machine_types(&self) -> Vec<String> {
        self.machine_types.iter().map(|t| t.describe()).collect()
    }

    /// All offered volume type names
    pub fn describe_volume_types(&self) -> Vec<String> {
        self.volume_types.iter().map(|t| t.name.clone()).collect()
    }

    /// All offered availability zone names
    pub fn describe_zones(&self) -> Vec<String> {
        self.availability_zones.iter().map(|z| z.name.clone()).collect()
    }
}
