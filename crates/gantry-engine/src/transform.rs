//! Translation between the domain model and the service wire format
//!
//! [`to_wire`] builds the submission payload from a validated spec,
//! omitting optional blocks entirely when they carry nothing. The
//! reverse direction, [`to_observed`], is tolerant: whatever shape the
//! service returns becomes a best-effort observed state rather than an
//! error.

use gantry_common::model::{
    AclExtension, ClusterHealth, ClusterSpec, Extensions, HibernationSchedule, MachineImage,
    MaintenanceWindow, NodePoolSpec, ObservabilityExtension, ObservedState, Taint,
};
use gantry_provisioner::wire::{
    WireAcl, WireAutoUpdate, WireCluster, WireCri, WireExtensions, WireHibernation, WireImage,
    WireKubernetes, WireMachine, WireMaintenance, WireNodePool, WireObservability, WireTaint,
    WireTimeWindow, WireVolume,
};

/// Build the wire payload for a validated, normalized spec
pub fn to_wire(spec: &ClusterSpec) -> WireCluster {
    WireCluster {
        name: spec.name.clone(),
        kubernetes: WireKubernetes {
            version: spec.kubernetes_version.clone(),
            allow_privileged_containers: Some(spec.allow_privileged_containers),
        },
        nodepools: spec.node_pools.iter().map(pool_to_wire).collect(),
        maintenance: spec.maintenance.as_ref().map(maintenance_to_wire),
        hibernations: if spec.hibernation_schedules.is_empty() {
            None
        } else {
            Some(
                spec.hibernation_schedules
                    .iter()
                    .map(hibernation_to_wire)
                    .collect(),
            )
        },
        extensions: extensions_to_wire(spec.extensions.as_ref()),
        status: None,
    }
}

fn pool_to_wire(pool: &NodePoolSpec) -> WireNodePool {
    let volume = if pool.volume_type.is_some() || pool.volume_size_gb.is_some() {
        Some(WireVolume {
            type_: pool.volume_type.clone(),
            size: pool.volume_size_gb,
        })
    } else {
        None
    };

    WireNodePool {
        name: pool.name.clone(),
        machine: WireMachine {
            type_: pool.machine_type.clone(),
            image: WireImage {
                name: pool.machine_image.name.clone(),
                version: pool.machine_image.version.clone(),
            },
        },
        minimum: pool.min_count,
        maximum: pool.max_count,
        max_surge: pool.max_surge,
        max_unavailable: pool.max_unavailable,
        volume,
        cri: pool
            .container_runtime
            .as_ref()
            .map(|name| WireCri { name: name.clone() }),
        labels: if pool.labels.is_empty() {
            None
        } else {
            Some(pool.labels.clone())
        },
        taints: if pool.taints.is_empty() {
            None
        } else {
            Some(pool.taints.iter().map(taint_to_wire).collect())
        },
        availability_zones: pool.availability_zones.clone(),
    }
}

fn taint_to_wire(taint: &Taint) -> WireTaint {
    WireTaint {
        key: taint.key.clone(),
        value: taint.value.clone(),
        effect: taint.effect,
    }
}

fn maintenance_to_wire(window: &MaintenanceWindow) -> WireMaintenance {
    WireMaintenance {
        auto_update: WireAutoUpdate {
            kubernetes_version: window.kubernetes_version_updates,
            machine_image_version: window.machine_image_updates,
        },
        time_window: WireTimeWindow {
            start: window.start.clone(),
            end: window.end.clone(),
        },
    }
}

fn hibernation_to_wire(schedule: &HibernationSchedule) -> WireHibernation {
    WireHibernation {
        start: schedule.start.clone(),
        end: schedule.end.clone(),
        timezone: schedule.timezone.clone(),
    }
}

fn extensions_to_wire(extensions: Option<&Extensions>) -> Option<WireExtensions> {
    let extensions = extensions.filter(|e| e.is_configured())?;
    Some(WireExtensions {
        observability: extensions.observability.as_ref().map(|o| WireObservability {
            enabled: o.enabled,
            instance_id: o.instance_id.clone(),
        }),
        acl: extensions.acl.as_ref().map(|a| WireAcl {
            enabled: a.enabled,
            allowed_cidrs: a.allowed_cidrs.clone(),
        }),
    })
}

/// Build observed state from a wire payload
///
/// `previous` supplies the last known concrete version for the one case
/// the payload cannot answer itself: no in-use version in status and a
/// partial desired version.
pub fn to_observed(
    project_id: &str,
    wire: &WireCluster,
    previous: Option<&ObservedState>,
) -> ObservedState {
    let status = wire.status.as_ref();
    let status_in_use = status.and_then(|s| s.kubernetes_version.as_deref());
    let previous_in_use = previous.map(|p| p.kubernetes_version.as_str());

    ObservedState {
        name: wire.name.clone(),
        project_id: project_id.to_string(),
        kubernetes_version: effective_version(
            &wire.kubernetes.version,
            status_in_use,
            previous_in_use,
        ),
        health: observed_health(wire),
        allow_privileged_containers: wire
            .kubernetes
            .allow_privileged_containers
            .unwrap_or_default(),
        node_pools: wire.nodepools.iter().map(pool_from_wire).collect(),
        maintenance: wire.maintenance.as_ref().map(maintenance_from_wire),
        hibernation_schedules: wire
            .hibernations
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(hibernation_from_wire)
            .collect(),
        extensions: extensions_from_wire(wire.extensions.as_ref()),
        credentials: None,
        status_message: status_error_message(wire),
    }
}

fn pool_from_wire(pool: &WireNodePool) -> NodePoolSpec {
    NodePoolSpec {
        name: pool.name.clone(),
        machine_type: pool.machine.type_.clone(),
        machine_image: MachineImage {
            name: pool.machine.image.name.clone(),
            version: pool.machine.image.version.clone(),
        },
        min_count: pool.minimum,
        max_count: pool.maximum,
        max_surge: pool.max_surge,
        max_unavailable: pool.max_unavailable,
        volume_type: pool.volume.as_ref().and_then(|v| v.type_.clone()),
        volume_size_gb: pool.volume.as_ref().and_then(|v| v.size),
        container_runtime: pool.cri.as_ref().map(|c| c.name.clone()),
        labels: pool.labels.clone().unwrap_or_default(),
        taints: pool
            .taints
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(taint_from_wire)
            .collect(),
        availability_zones: pool.availability_zones.clone(),
    }
}

fn taint_from_wire(taint: &WireTaint) -> Taint {
    Taint {
        key: taint.key.clone(),
        value: taint.value.clone(),
        effect: taint.effect,
    }
}

fn maintenance_from_wire(maintenance: &WireMaintenance) -> MaintenanceWindow {
    MaintenanceWindow {
        kubernetes_version_updates: maintenance.auto_update.kubernetes_version,
        machine_image_updates: maintenance.auto_update.machine_image_version,
        start: maintenance.time_window.start.clone(),
        end: maintenance.time_window.end.clone(),
    }
}

fn hibernation_from_wire(hibernation: &WireHibernation) -> HibernationSchedule {
    HibernationSchedule {
        start: hibernation.start.clone(),
        end: hibernation.end.clone(),
        timezone: hibernation.timezone.clone(),
    }
}

fn extensions_from_wire(extensions: Option<&WireExtensions>) -> Option<Extensions> {
    let extensions = extensions?;
    let mapped = Extensions {
        observability: extensions
            .observability
            .as_ref()
            .map(|o| ObservabilityExtension {
                enabled: o.enabled,
                instance_id: o.instance_id.clone(),
            }),
        acl: extensions.acl.as_ref().map(|a| AclExtension {
            enabled: a.enabled,
            allowed_cidrs: a.allowed_cidrs.clone(),
        }),
    };
    mapped.is_configured().then_some(mapped)
}

// ============================================================================
// Pure Functions - Extracted for Unit Testability
// ============================================================================

/// Aggregated health carried by a wire payload
pub fn observed_health(wire: &WireCluster) -> ClusterHealth {
    wire.status
        .as_ref()
        .and_then(|s| s.aggregated.as_deref())
        .map(ClusterHealth::from_wire)
        .unwrap_or_default()
}

/// Provider-supplied failure detail, if any
pub fn status_error_message(wire: &WireCluster) -> Option<String> {
    let error = wire.status.as_ref()?.error.as_ref()?;
    match (error.code.as_deref(), error.message.as_deref()) {
        (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
        (None, Some(message)) => Some(message.to_string()),
        (Some(code), None) => Some(code.to_string()),
        (None, None) => None,
    }
}

/// Pick the concrete version to report as observed
///
/// The in-use version from status wins. Without it, a partial desired
/// version (fewer than three components) falls back to the previously
/// known concrete version rather than reporting something no cluster
/// can literally run.
fn effective_version(
    wire_desired: &str,
    status_in_use: Option<&str>,
    previous_in_use: Option<&str>,
) -> String {
    if let Some(in_use) = status_in_use {
        if !in_use.is_empty() {
            return in_use.to_string();
        }
    }

    if wire_desired.split('.').count() < 3 {
        if let Some(prev) = previous_in_use {
            return prev.to_string();
        }
    }

    wire_desired.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_common::model::TaintEffect;
    use gantry_provisioner::wire::{WireStatus, WireStatusError};
    use std::collections::BTreeMap;

    fn full_spec() -> ClusterSpec {
        let mut labels = BTreeMap::new();
        labels.insert("tier".to_string(), "workers".to_string());

        ClusterSpec {
            name: "demo".to_string(),
            project_id: "p-1".to_string(),
            kubernetes_version: "1.18.1".to_string(),
            allow_privileged_containers: true,
            node_pools: vec![NodePoolSpec {
                name: "workers".to_string(),
                machine_type: "c1.2".to_string(),
                machine_image: MachineImage {
                    name: Some("flatcar".to_string()),
                    version: Some("3815.2.0".to_string()),
                },
                min_count: Some(1),
                max_count: Some(3),
                max_surge: Some(1),
                max_unavailable: Some(0),
                volume_type: Some("storage_premium_perf1".to_string()),
                volume_size_gb: Some(20),
                container_runtime: Some("containerd".to_string()),
                labels,
                taints: vec![Taint {
                    key: "dedicated".to_string(),
                    value: Some("batch".to_string()),
                    effect: TaintEffect::NoExecute,
                }],
                availability_zones: vec!["eu01-1".to_string(), "eu01-2".to_string()],
            }],
            maintenance: Some(MaintenanceWindow {
                kubernetes_version_updates: true,
                machine_image_updates: false,
                start: "01:00:00Z".to_string(),
                end: "02:00:00Z".to_string(),
            }),
            hibernation_schedules: vec![HibernationSchedule {
                start: "0 20 * * *".to_string(),
                end: "0 6 * * *".to_string(),
                timezone: Some("Europe/Berlin".to_string()),
            }],
            extensions: Some(Extensions {
                observability: Some(ObservabilityExtension {
                    enabled: true,
                    instance_id: Some("obs-1".to_string()),
                }),
                acl: Some(AclExtension {
                    enabled: true,
                    allowed_cidrs: vec!["10.0.0.0/8".to_string()],
                }),
            }),
        }
    }

    /// Story: A spec survives the trip through the wire format intact
    ///
    /// Submitting a payload and reading it straight back must observe
    /// the same pools, maintenance, hibernation, and extensions.
    #[test]
    fn story_round_trip_preserves_spec() {
        let spec = full_spec();
        let wire = to_wire(&spec);
        let observed = to_observed("p-1", &wire, None);

        assert_eq!(observed.name, spec.name);
        assert_eq!(observed.kubernetes_version, spec.kubernetes_version);
        assert_eq!(
            observed.allow_privileged_containers,
            spec.allow_privileged_containers
        );
        assert_eq!(observed.node_pools, spec.node_pools);
        assert_eq!(observed.maintenance, spec.maintenance);
        assert_eq!(observed.hibernation_schedules, spec.hibernation_schedules);
        assert_eq!(observed.extensions, spec.extensions);
        assert_eq!(observed.health, ClusterHealth::Unspecified);
        assert!(observed.credentials.is_none());
    }

    /// Story: Empty optional blocks leave the payload entirely
    ///
    /// The service distinguishes "absent" from "empty"; sending `{}` or
    /// `[]` where nothing was configured changes server behavior.
    #[test]
    fn story_empty_blocks_omitted_from_payload() {
        let spec = ClusterSpec {
            name: "bare".to_string(),
            project_id: "p-1".to_string(),
            kubernetes_version: "1.18.1".to_string(),
            node_pools: vec![NodePoolSpec {
                name: "workers".to_string(),
                machine_type: "c1.2".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let wire = to_wire(&spec);
        assert!(wire.maintenance.is_none());
        assert!(wire.hibernations.is_none());
        assert!(wire.extensions.is_none());
        assert!(wire.status.is_none());

        let pool = &wire.nodepools[0];
        assert!(pool.labels.is_none());
        assert!(pool.taints.is_none());
        assert!(pool.volume.is_none());
        assert!(pool.cri.is_none());

        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("maintenance").is_none());
        assert!(json["nodepools"][0].get("labels").is_none());
    }

    #[test]
    fn test_extensions_without_content_omitted() {
        let mut spec = full_spec();
        spec.extensions = Some(Extensions::default());
        assert!(to_wire(&spec).extensions.is_none());
    }

    #[test]
    fn test_volume_block_present_when_only_size_set() {
        let mut spec = full_spec();
        spec.node_pools[0].volume_type = None;
        spec.node_pools[0].volume_size_gb = Some(50);

        let wire = to_wire(&spec);
        let volume = wire.nodepools[0].volume.as_ref().unwrap();
        assert!(volume.type_.is_none());
        assert_eq!(volume.size, Some(50));
    }

    #[test]
    fn test_observed_health_and_error_from_status() {
        let mut wire = to_wire(&full_spec());
        wire.status = Some(WireStatus {
            aggregated: Some("STATE_FAILED".to_string()),
            kubernetes_version: None,
            error: Some(WireStatusError {
                code: Some("SKE-QUOTA".to_string()),
                message: Some("quota exceeded".to_string()),
            }),
        });

        assert_eq!(observed_health(&wire), ClusterHealth::Error);
        assert_eq!(
            status_error_message(&wire).as_deref(),
            Some("SKE-QUOTA: quota exceeded")
        );

        let observed = to_observed("p-1", &wire, None);
        assert_eq!(observed.health, ClusterHealth::Error);
        assert_eq!(observed.status_message.as_deref(), Some("SKE-QUOTA: quota exceeded"));
    }

    #[test]
    fn test_status_error_message_partial_fields() {
        let mut wire = to_wire(&full_spec());

        wire.status = Some(WireStatus {
            error: Some(WireStatusError {
                code: None,
                message: Some("just a message".to_string()),
            }),
            ..Default::default()
        });
        assert_eq!(status_error_message(&wire).as_deref(), Some("just a message"));

        wire.status = Some(WireStatus::default());
        assert_eq!(status_error_message(&wire), None);

        wire.status = None;
        assert_eq!(status_error_message(&wire), None);
        assert_eq!(observed_health(&wire), ClusterHealth::Unspecified);
    }

    mod effective_version {
        use super::*;

        #[test]
        fn test_status_in_use_wins() {
            assert_eq!(
                effective_version("1.18", Some("1.18.1"), Some("1.17.9")),
                "1.18.1"
            );
            assert_eq!(
                effective_version("1.18.2", Some("1.18.1"), None),
                "1.18.1"
            );
        }

        #[test]
        fn test_partial_desired_falls_back_to_previous() {
            assert_eq!(effective_version("1.18", None, Some("1.18.1")), "1.18.1");
        }

        #[test]
        fn test_concrete_desired_stands_on_its_own() {
            assert_eq!(effective_version("1.18.2", None, Some("1.18.1")), "1.18.2");
            assert_eq!(effective_version("1.18", None, None), "1.18");
        }

        #[test]
        fn test_empty_status_version_ignored() {
            assert_eq!(effective_version("1.18.2", Some(""), None), "1.18.2");
        }
    }

    #[test]
    fn test_observed_tolerates_minimal_payload() {
        let wire = WireCluster {
            name: "sparse".to_string(),
            ..Default::default()
        };
        let observed = to_observed("p-1", &wire, None);
        assert_eq!(observed.name, "sparse");
        assert!(observed.node_pools.is_empty());
        assert_eq!(observed.health, ClusterHealth::Unspecified);
        assert!(!observed.allow_privileged_containers);
    }
}
