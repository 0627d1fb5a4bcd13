//! Field-level diff between desired spec and observed state
//!
//! Drives the update short-circuit: an empty change set means the
//! service already holds the desired state and no write is needed.
//! Server-owned fields (health, credentials, status detail) never
//! count as drift. Pools are matched by name, so reordering a spec's
//! pool list is not a change.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use gantry_common::model::{ClusterSpec, NodePoolSpec, ObservedState};

/// One field that differs between observed and desired state
#[derive(Clone, Debug, PartialEq)]
pub struct FieldChange {
    /// Field path (e.g. "nodePools[workers].machineType")
    pub field: String,
    /// Currently observed value
    pub previous: String,
    /// Value the spec asks for
    pub desired: String,
}

/// All fields that differ between observed and desired state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    /// True when nothing differs
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of differing fields
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// The differing fields in detection order
    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Field paths only, for compact assertions and logs
    pub fn fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }

    fn record(&mut self, field: impl Into<String>, previous: String, desired: String) {
        if previous != desired {
            self.changes.push(FieldChange {
                field: field.into(),
                previous,
                desired,
            });
        }
    }

    fn record_value<T: PartialEq + fmt::Debug>(
        &mut self,
        field: impl Into<String>,
        previous: &T,
        desired: &T,
    ) {
        if previous != desired {
            self.changes.push(FieldChange {
                field: field.into(),
                previous: format!("{:?}", previous),
                desired: format!("{:?}", desired),
            });
        }
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(
                f,
                "{}: {} -> {}",
                change.field, change.previous, change.desired
            )?;
        }
        Ok(())
    }
}

/// Compute what would change if `desired` were submitted over `observed`
pub fn cluster_changes(desired: &ClusterSpec, observed: &ObservedState) -> ChangeSet {
    let mut set = ChangeSet::default();

    set.record("name", observed.name.clone(), desired.name.clone());
    set.record(
        "kubernetesVersion",
        observed.kubernetes_version.clone(),
        desired.kubernetes_version.clone(),
    );
    set.record(
        "allowPrivilegedContainers",
        observed.allow_privileged_containers.to_string(),
        desired.allow_privileged_containers.to_string(),
    );

    let observed_pools: BTreeMap<&str, &NodePoolSpec> = observed
        .node_pools
        .iter()
        .map(|p| (p.name.as_str(), p))
        .collect();
    let desired_names: BTreeSet<&str> = desired
        .node_pools
        .iter()
        .map(|p| p.name.as_str())
        .collect();

    for pool in &desired.node_pools {
        match observed_pools.get(pool.name.as_str()) {
            Some(current) => pool_changes(&mut set, pool, current),
            None => set.record(
                format!("nodePools[{}]", pool.name),
                "absent".to_string(),
                "present".to_string(),
            ),
        }
    }

    for pool in &observed.node_pools {
        if !desired_names.contains(pool.name.as_str()) {
            set.record(
                format!("nodePools[{}]", pool.name),
                "present".to_string(),
                "absent".to_string(),
            );
        }
    }

    set.record_value("maintenance", &observed.maintenance, &desired.maintenance);
    set.record_value(
        "hibernationSchedules",
        &observed.hibernation_schedules,
        &desired.hibernation_schedules,
    );
    set.record_value("extensions", &observed.extensions, &desired.extensions);

    set
}

fn pool_changes(set: &mut ChangeSet, desired: &NodePoolSpec, observed: &NodePoolSpec) {
    let prefix = format!("nodePools[{}]", desired.name);

    set.record(
        format!("{}.machineType", prefix),
        observed.machine_type.clone(),
        desired.machine_type.clone(),
    );
    set.record(
        format!("{}.machineImage", prefix),
        display_opt(&observed.machine_image.name),
        display_opt(&desired.machine_image.name),
    );
    set.record(
        format!("{}.machineImageVersion", prefix),
        display_opt(&observed.machine_image.version),
        display_opt(&desired.machine_image.version),
    );
    set.record(
        format!("{}.minCount", prefix),
        display_opt(&observed.min_count),
        display_opt(&desired.min_count),
    );
    set.record(
        format!("{}.maxCount", prefix),
        display_opt(&observed.max_count),
        display_opt(&desired.max_count),
    );
    set.record(
        format!("{}.maxSurge", prefix),
        display_opt(&observed.max_surge),
        display_opt(&desired.max_surge),
    );
    set.record(
        format!("{}.maxUnavailable", prefix),
        display_opt(&observed.max_unavailable),
        display_opt(&desired.max_unavailable),
    );
    set.record(
        format!("{}.volumeType", prefix),
        display_opt(&observed.volume_type),
        display_opt(&desired.volume_type),
    );
    set.record(
        format!("{}.volumeSizeGb", prefix),
        display_opt(&observed.volume_size_gb),
        display_opt(&desired.volume_size_gb),
    );
    set.record(
        format!("{}.containerRuntime", prefix),
        display_opt(&observed.container_runtime),
        display_opt(&desired.container_runtime),
    );
    set.record_value(format!("{}.labels", prefix), &observed.labels, &desired.labels);
    set.record_value(format!("{}.taints", prefix), &observed.taints, &desired.taints);
    set.record_value(
        format!("{}.availabilityZones", prefix),
        &observed.availability_zones,
        &desired.availability_zones,
    );
}

fn display_opt<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "unset".to_string(),
    }
}
