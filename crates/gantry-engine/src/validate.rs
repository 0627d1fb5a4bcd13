//! Catalog validation of a normalized cluster spec
//!
//! Checks run in a fixed order (cluster version, then per pool: image
//! name, image version, machine type, volume type, zones) and stop at
//! the first failure. Every rejection enumerates the complete set of
//! values the provider accepts for that field, so one failed reconcile
//! is enough to correct the spec.
//!
//! Validation also resolves unset machine image versions: the returned
//! spec carries a concrete version for every pool.

use gantry_common::model::{ClusterSpec, NodePoolSpec, ProviderOptions};
use gantry_common::{Error, Result};

/// Validate a spec against the capability catalog
///
/// Expects `spec.kubernetes_version` to be already resolved and pools to
/// be normalized. With no catalog at hand (`options` is `None`) the spec
/// passes through unchanged and the provisioning service is the final
/// authority.
pub fn validate_cluster(
    spec: &ClusterSpec,
    options: Option<&ProviderOptions>,
) -> Result<ClusterSpec> {
    let Some(options) = options else {
        return Ok(spec.clone());
    };

    check_cluster_version(spec, options)?;

    let mut validated = spec.clone();
    for pool in &mut validated.node_pools {
        let resolved = check_machine_image(&spec.name, pool, options)?;
        pool.machine_image.version = Some(resolved);
        check_machine_type(&spec.name, pool, options)?;
        check_volume_type(&spec.name, pool, options)?;
        check_zones(&spec.name, pool, options)?;
    }

    Ok(validated)
}

/// The cluster version must be listed in the catalog
///
/// Presence in any lifecycle state is enough: a version may leave
/// supported state while a running cluster still uses it, and such
/// clusters must stay reconcilable. Fresh resolution happens before
/// validation and only ever picks supported entries.
fn check_cluster_version(spec: &ClusterSpec, options: &ProviderOptions) -> Result<()> {
    let listed = options
        .kubernetes_versions
        .iter()
        .any(|v| v.version == spec.kubernetes_version);
    if listed {
        return Ok(());
    }

    let accepted = options.describe_versions();
    Err(Error::validation_rejected(
        &spec.name,
        "kubernetesVersion",
        &spec.kubernetes_version,
        accepted.clone(),
        format!(
            "version '{}' is not offered; offered: {}",
            spec.kubernetes_version,
            accepted.join(", ")
        ),
    ))
}

/// The pool's image must exist and yield a concrete supported version
///
/// Returns the version to pin: the explicit one when set (and offered in
/// supported state), otherwise the catalog's first supported version for
/// the image.
fn check_machine_image(
    cluster: &str,
    pool: &NodePoolSpec,
    options: &ProviderOptions,
) -> Result<String> {
    let name_field = format!("nodePools[{}].machineImage", pool.name);

    let Some(name) = pool.machine_image.name.as_deref() else {
        return Err(Error::validation_for_field(
            cluster,
            name_field,
            "machine image name is unset after normalization",
        ));
    };

    let Some(image) = options.find_image(name) else {
        let accepted = options.describe_images();
        return Err(Error::validation_rejected(
            cluster,
            name_field,
            name,
            accepted.clone(),
            format!(
                "machine image '{}' is not offered; offered: {}",
                name,
                accepted.join(", ")
            ),
        ));
    };

    let version_field = format!("nodePools[{}].machineImageVersion", pool.name);

    match pool.machine_image.version.as_deref() {
        Some(version) => {
            let offered = image
                .versions
                .iter()
                .any(|v| v.version == version && v.is_supported());
            if offered {
                return Ok(version.to_string());
            }

            let accepted: Vec<String> = image
                .versions
                .iter()
                .filter(|v| v.is_supported())
                .map(|v| v.version.clone())
                .collect();
            Err(Error::validation_rejected(
                cluster,
                version_field,
                version,
                accepted,
                format!(
                    "image '{}' version '{}' is not offered in supported state; offered: {}",
                    name,
                    version,
                    image.describe_versions().join(", ")
                ),
            ))
        }
        None => match image.first_supported() {
            Some(v) => Ok(v.version.clone()),
            None => Err(Error::validation_for_field(
                cluster,
                version_field,
                format!(
                    "image '{}' has no version in supported state; offered: {}",
                    name,
                    image.describe_versions().join(", ")
                ),
            )),
        },
    }
}

fn check_machine_type(
    cluster: &str,
    pool: &NodePoolSpec,
    options: &ProviderOptions,
) -> Result<()> {
    if options.has_machine_type(&pool.machine_type) {
        return Ok(());
    }

    let accepted = options.describe_machine_types();
    Err(Error::validation_rejected(
        cluster,
        format!("nodePools[{}].machineType", pool.name),
        &pool.machine_type,
        accepted.clone(),
        format!(
            "machine type '{}' is not offered; offered: {}",
            pool.machine_type,
            accepted.join(", ")
        ),
    ))
}

fn check_volume_type(cluster: &str, pool: &NodePoolSpec, options: &ProviderOptions) -> Result<()> {
    // Unset only happens when validating a non-normalized spec directly;
    // nothing to check then.
    let Some(volume_type) = pool.volume_type.as_deref() else {
        return Ok(());
    };

    if options.has_volume_type(volume_type) {
        return Ok(());
    }

    let accepted = options.describe_volume_types();
    Err(Error::validation_rejected(
        cluster,
        format!("nodePools[{}].volumeType", pool.name),
        volume_type,
        accepted.clone(),
        format!(
            "volume type '{}' is not offered; offered: {}",
            volume_type,
            accepted.join(", ")
        ),
    ))
}

fn check_zones(cluster: &str, pool: &NodePoolSpec, options: &ProviderOptions) -> Result<()> {
    let field = format!("nodePools[{}].availabilityZones", pool.name);
    let accepted = options.describe_zones();

    if pool.availability_zones.is_empty() {
        return Err(Error::validation_rejected(
            cluster,
            field,
            "",
            accepted.clone(),
            format!(
                "at least one availability zone is required; offered: {}",
                accepted.join(", ")
            ),
        ));
    }

    for zone in &pool.availability_zones {
        if !options.has_zone(zone) {
            return Err(Error::validation_rejected(
                cluster,
                field,
                zone,
                accepted.clone(),
                format!(
                    "availability zone '{}' is not offered; offered: {}",
                    zone,
                    accepted.join(", ")
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_common::model::{
        LifecycleState, MachineImage, MachineTypeOption, SupportedImage, SupportedVersion,
        VolumeTypeOption, ZoneOption,
    };

    fn version(v: &str, state: LifecycleState) -> SupportedVersion {
        SupportedVersion {
            version: v.to_string(),
            state,
            expiration_date: None,
        }
    }

    fn sample_catalog() -> ProviderOptions {
        ProviderOptions {
            kubernetes_versions: vec![
                version("1.17.9", LifecycleState::Deprecated),
                version("1.18.0", LifecycleState::Supported),
                version("1.18.1", LifecycleState::Supported),
            ],
            machine_images: vec![
                SupportedImage {
                    name: "flatcar".to_string(),
                    versions: vec![
                        version("3815.2.0", LifecycleState::Supported),
                        version("3602.1.0", LifecycleState::Deprecated),
                    ],
                },
                SupportedImage {
                    name: "ubuntu".to_string(),
                    versions: vec![version("22.04", LifecycleState::Deprecated)],
                },
            ],
            machine_types: vec![
                MachineTypeOption {
                    name: "c1.2".to_string(),
                    cpu: 2,
                    memory: 8,
                },
                MachineTypeOption {
                    name: "c1.4".to_string(),
                    cpu: 4,
                    memory: 16,
                },
            ],
            volume_types: vec![VolumeTypeOption {
                name: "storage_premium_perf1".to_string(),
            }],
            availability_zones: vec![
                ZoneOption {
                    name: "eu01-1".to_string(),
                },
                ZoneOption {
                    name: "eu01-2".to_string(),
                },
            ],
        }
    }

    fn normalized_pool(name: &str) -> NodePoolSpec {
        NodePoolSpec {
            name: name.to_string(),
            machine_type: "c1.2".to_string(),
            machine_image: MachineImage {
                name: Some("flatcar".to_string()),
                version: None,
            },
            min_count: Some(1),
            max_count: Some(2),
            max_surge: Some(1),
            max_unavailable: Some(0),
            volume_type: Some("storage_premium_perf1".to_string()),
            volume_size_gb: Some(20),
            container_runtime: Some("containerd".to_string()),
            availability_zones: vec!["eu01-1".to_string()],
            ..Default::default()
        }
    }

    fn normalized_spec() -> ClusterSpec {
        ClusterSpec {
            name: "demo".to_string(),
            project_id: "p-1".to_string(),
            kubernetes_version: "1.18.1".to_string(),
            node_pools: vec![normalized_pool("workers")],
            ..Default::default()
        }
    }

    fn field_of(err: &Error) -> String {
        match err {
            Error::Validation { field, .. } => field.clone(),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    // ==========================================================================
    // Story Tests: First-Failure Validation With Full Enumeration
    // ==========================================================================

    /// Story: A valid spec passes and comes back with pinned image versions
    #[test]
    fn story_valid_spec_resolves_image_versions() {
        let validated = validate_cluster(&normalized_spec(), Some(&sample_catalog())).unwrap();
        assert_eq!(
            validated.node_pools[0].machine_image.version.as_deref(),
            Some("3815.2.0")
        );
        // Everything else is untouched
        assert_eq!(validated.kubernetes_version, "1.18.1");
        assert_eq!(validated.node_pools[0].machine_type, "c1.2");
    }

    /// Story: With several problems, only the first in check order is reported
    ///
    /// Order within a pool: image name, image version, machine type,
    /// volume type, zones. The cluster version comes before any pool.
    #[test]
    fn story_first_failure_wins() {
        let catalog = sample_catalog();

        // Bad cluster version beats a bad machine type
        let mut spec = normalized_spec();
        spec.kubernetes_version = "1.42.0".to_string();
        spec.node_pools[0].machine_type = "c9.999".to_string();
        assert_eq!(
            field_of(&validate_cluster(&spec, Some(&catalog)).unwrap_err()),
            "kubernetesVersion"
        );

        // Bad image beats a bad machine type within the same pool
        let mut spec = normalized_spec();
        spec.node_pools[0].machine_image.name = Some("rhel".to_string());
        spec.node_pools[0].machine_type = "c9.999".to_string();
        assert_eq!(
            field_of(&validate_cluster(&spec, Some(&catalog)).unwrap_err()),
            "nodePools[workers].machineImage"
        );

        // Bad machine type beats a bad zone
        let mut spec = normalized_spec();
        spec.node_pools[0].machine_type = "c9.999".to_string();
        spec.node_pools[0].availability_zones = vec!["mars-1".to_string()];
        assert_eq!(
            field_of(&validate_cluster(&spec, Some(&catalog)).unwrap_err()),
            "nodePools[workers].machineType"
        );

        // Earlier pools are checked before later ones
        let mut spec = normalized_spec();
        spec.node_pools.push(normalized_pool("batch"));
        spec.node_pools[0].volume_type = Some("storage_unknown".to_string());
        spec.node_pools[1].machine_type = "c9.999".to_string();
        assert_eq!(
            field_of(&validate_cluster(&spec, Some(&catalog)).unwrap_err()),
            "nodePools[workers].volumeType"
        );
    }

    /// Story: Rejections enumerate everything the provider accepts
    #[test]
    fn story_rejection_enumerates_accepted_set() {
        let mut spec = normalized_spec();
        spec.node_pools[0].machine_type = "c9.999".to_string();

        let err = validate_cluster(&spec, Some(&sample_catalog())).unwrap_err();
        assert_eq!(
            err.accepted(),
            &[
                "c1.2 (2 cpu, 8 GB)".to_string(),
                "c1.4 (4 cpu, 16 GB)".to_string()
            ]
        );
        assert!(err.to_string().contains("c9.999"));
        assert!(err.to_string().contains("c1.4 (4 cpu, 16 GB)"));
    }

    /// Story: Without a catalog the spec passes through untouched
    #[test]
    fn story_no_catalog_passes_through() {
        let mut spec = normalized_spec();
        spec.node_pools[0].machine_type = "anything-goes".to_string();

        let validated = validate_cluster(&spec, None).unwrap();
        assert_eq!(validated, spec);
        // No catalog also means no image version resolution
        assert_eq!(validated.node_pools[0].machine_image.version, None);
    }

    /// Story: A deprecated cluster version stays reconcilable
    ///
    /// Running clusters can outlive their version's supported window;
    /// presence in the catalog is enough for the cluster version.
    #[test]
    fn story_deprecated_cluster_version_accepted() {
        let mut spec = normalized_spec();
        spec.kubernetes_version = "1.17.9".to_string();
        assert!(validate_cluster(&spec, Some(&sample_catalog())).is_ok());
    }

    mod cluster_version {
        use super::*;

        #[test]
        fn test_unlisted_version_rejected_with_lifecycle_annotations() {
            let mut spec = normalized_spec();
            spec.kubernetes_version = "1.20.0".to_string();

            let err = validate_cluster(&spec, Some(&sample_catalog())).unwrap_err();
            assert_eq!(
                err.accepted(),
                &[
                    "1.17.9 (deprecated)".to_string(),
                    "1.18.0 (supported)".to_string(),
                    "1.18.1 (supported)".to_string()
                ]
            );
        }
    }

    mod machine_image {
        use super::*;

        #[test]
        fn test_unknown_image_lists_offered_images() {
            let mut spec = normalized_spec();
            spec.node_pools[0].machine_image.name = Some("rhel".to_string());

            let err = validate_cluster(&spec, Some(&sample_catalog())).unwrap_err();
            assert_eq!(err.accepted(), &["flatcar".to_string(), "ubuntu".to_string()]);
        }

        #[test]
        fn test_explicit_supported_version_kept() {
            let mut spec = normalized_spec();
            spec.node_pools[0].machine_image.version = Some("3815.2.0".to_string());

            let validated = validate_cluster(&spec, Some(&sample_catalog())).unwrap();
            assert_eq!(
                validated.node_pools[0].machine_image.version.as_deref(),
                Some("3815.2.0")
            );
        }

        #[test]
        fn test_explicit_deprecated_version_rejected() {
            let mut spec = normalized_spec();
            spec.node_pools[0].machine_image.version = Some("3602.1.0".to_string());

            let err = validate_cluster(&spec, Some(&sample_catalog())).unwrap_err();
            assert_eq!(
                field_of(&err),
                "nodePools[workers].machineImageVersion"
            );
            // Accepted set carries only supported versions, the message
            // shows everything with its state
            assert_eq!(err.accepted(), &["3815.2.0".to_string()]);
            assert!(err.to_string().contains("3602.1.0 (deprecated)"));
        }

        #[test]
        fn test_image_without_supported_versions_rejected() {
            let mut spec = normalized_spec();
            spec.node_pools[0].machine_image.name = Some("ubuntu".to_string());

            let err = validate_cluster(&spec, Some(&sample_catalog())).unwrap_err();
            assert!(err.to_string().contains("no version in supported state"));
        }

        #[test]
        fn test_unset_image_name_rejected() {
            let mut spec = normalized_spec();
            spec.node_pools[0].machine_image = MachineImage::default();

            let err = validate_cluster(&spec, Some(&sample_catalog())).unwrap_err();
            assert!(err.to_string().contains("unset after normalization"));
        }
    }

    mod zones {
        use super::*;

        #[test]
        fn test_empty_zones_rejected_with_enumeration() {
            let mut spec = normalized_spec();
            spec.node_pools[0].availability_zones.clear();

            let err = validate_cluster(&spec, Some(&sample_catalog())).unwrap_err();
            assert_eq!(
                field_of(&err),
                "nodePools[workers].availabilityZones"
            );
            assert_eq!(err.accepted(), &["eu01-1".to_string(), "eu01-2".to_string()]);
        }

        #[test]
        fn test_single_unknown_zone_rejected() {
            let mut spec = normalized_spec();
            spec.node_pools[0].availability_zones =
                vec!["eu01-1".to_string(), "eu01-9".to_string()];

            let err = validate_cluster(&spec, Some(&sample_catalog())).unwrap_err();
            assert!(err.to_string().contains("eu01-9"));
            assert_eq!(err.accepted(), &["eu01-1".to_string(), "eu01-2".to_string()]);
        }
    }

    #[test]
    fn test_unset_volume_type_skipped() {
        let mut spec = normalized_spec();
        spec.node_pools[0].volume_type = None;
        assert!(validate_cluster(&spec, Some(&sample_catalog())).is_ok());
    }
}
