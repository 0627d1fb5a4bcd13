//! Node pool normalization
//!
//! Operators may leave most pool fields unset; a [`DefaultPolicy`] fills
//! the gaps before validation so that every payload reaching the service
//! is fully specified. Explicit values always win, and filling is
//! idempotent, so re-running a reconcile never flips a field back.

use serde::{Deserialize, Serialize};

use gantry_common::model::NodePoolSpec;

/// Fallback values for node pool fields the operator left unset
///
/// Image versions are deliberately not part of the policy: they resolve
/// against the live catalog instead of a static value that would go
/// stale.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultPolicy {
    /// Image name when the pool names none
    pub machine_image_name: String,
    /// Minimum node count
    pub min_count: u32,
    /// Maximum node count
    pub max_count: u32,
    /// Nodes that may be created above maximum during a rolling update
    pub max_surge: u32,
    /// Nodes that may be unavailable during a rolling update
    pub max_unavailable: u32,
    /// Volume type backing node disks
    pub volume_type: String,
    /// Node disk size in gigabytes
    pub volume_size_gb: u32,
    /// Container runtime
    pub container_runtime: String,
    /// Availability zone when the pool names none
    pub zone: String,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            machine_image_name: "flatcar".to_string(),
            min_count: 1,
            max_count: 2,
            max_surge: 1,
            max_unavailable: 0,
            volume_type: "storage_premium_perf1".to_string(),
            volume_size_gb: 20,
            container_runtime: "containerd".to_string(),
            zone: "eu01-1".to_string(),
        }
    }
}

/// Fill unset pool fields from the policy
pub fn apply_pool_defaults(pool: &mut NodePoolSpec, policy: &DefaultPolicy) {
    pool.machine_image
        .name
        .get_or_insert_with(|| policy.machine_image_name.clone());
    pool.min_count.get_or_insert(policy.min_count);
    pool.max_count.get_or_insert(policy.max_count);
    pool.max_surge.get_or_insert(policy.max_surge);
    pool.max_unavailable.get_or_insert(policy.max_unavailable);
    pool.volume_type
        .get_or_insert_with(|| policy.volume_type.clone());
    pool.volume_size_gb.get_or_insert(policy.volume_size_gb);
    pool.container_runtime
        .get_or_insert_with(|| policy.container_runtime.clone());
    if pool.availability_zones.is_empty() {
        pool.availability_zones.push(policy.zone.clone());
    }
}
