//! Kubernetes version resolution against the capability catalog
//!
//! The requested version is either exact ("1.18.1") or partial ("1.18",
//! "1"). Partial requests resolve to the newest matching version the
//! catalog offers in supported state. A cluster that is already running
//! never moves backward, whatever the request says; downgrades are not a
//! provider operation.

use semver::{Version, VersionReq};

use gantry_common::model::SupportedVersion;
use gantry_common::{Error, Result};

/// Resolve a requested version expression to a concrete catalog version
///
/// `previous_in_use` is the version the cluster currently runs, when
/// known. Resolution guarantees:
///
/// - a request equal to the running version is returned verbatim, even
///   if the catalog has since dropped the entry (validation decides
///   separately whether that is still acceptable)
/// - only catalog entries in supported state are eligible for fresh
///   resolution
/// - the result never sorts below the running version
pub fn resolve_version(
    requested: &str,
    supported: &[SupportedVersion],
    previous_in_use: Option<&str>,
) -> Result<String> {
    if let Some(prev) = previous_in_use {
        if prev == requested {
            return Ok(prev.to_string());
        }
    }

    let req = constraint_for(requested)?;

    let mut best: Option<(&str, Version)> = None;
    for entry in supported {
        if !entry.is_supported() {
            continue;
        }
        // Entries the catalog reports in a shape semver cannot parse
        // are skipped rather than failing the whole resolution.
        let Ok(version) = Version::parse(&entry.version) else {
            continue;
        };
        if !req.matches(&version) {
            continue;
        }
        if best.as_ref().map_or(true, |(_, cur)| version > *cur) {
            best = Some((&entry.version, version));
        }
    }

    let Some((best_str, best_version)) = best else {
        return Err(Error::no_matching_version(
            requested,
            supported.iter().map(|v| v.describe()).collect(),
        ));
    };

    if let Some(prev) = previous_in_use {
        if let Ok(prev_version) = Version::parse(prev) {
            if prev_version > best_version {
                return Ok(prev.to_string());
            }
        }
    }

    Ok(best_str.to_string())
}

/// Build the semver constraint for a requested version expression
///
/// Three components pin an exact version; fewer act as a floor within
/// that minor (or major) line, matching tilde semantics.
fn constraint_for(requested: &str) -> Result<VersionReq> {
    let expr = if requested.split('.').count() >= 3 {
        format!("={}", requested)
    } else {
        format!("~{}", requested)
    };

    VersionReq::parse(&expr)
        .map_err(|e| Error::validation(format!("invalid kubernetesVersion '{}': {}", requested, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_common::model::LifecycleState;

    fn entry(version: &str, state: LifecycleState) -> SupportedVersion {
        SupportedVersion {
            version: version.to_string(),
            state,
            expiration_date: None,
        }
    }

    fn catalog() -> Vec<SupportedVersion> {
        vec![
            entry("1.17.9", LifecycleState::Deprecated),
            entry("1.18.0", LifecycleState::Supported),
            entry("1.18.1", LifecycleState::Supported),
            entry("1.19.0", LifecycleState::Preview),
        ]
    }

    #[test]
    fn test_partial_request_resolves_to_newest_patch() {
        let resolved = resolve_version("1.18", &catalog(), None).unwrap();
        assert_eq!(resolved, "1.18.1");
    }

    #[test]
    fn test_major_only_request_resolves_within_major_line() {
        let resolved = resolve_version("1", &catalog(), None).unwrap();
        assert_eq!(resolved, "1.18.1");
    }

    #[test]
    fn test_exact_request_resolves_to_itself() {
        let resolved = resolve_version("1.18.0", &catalog(), None).unwrap();
        assert_eq!(resolved, "1.18.0");
    }

    #[test]
    fn test_exact_request_absent_from_catalog_fails() {
        let err = resolve_version("1.18.7", &catalog(), None).unwrap_err();
        match &err {
            Error::NoMatchingVersion { candidates, .. } => {
                // Every catalog entry is enumerated with its lifecycle state
                assert_eq!(candidates.len(), 4);
                assert!(candidates.contains(&"1.17.9 (deprecated)".to_string()));
                assert!(candidates.contains(&"1.19.0 (preview)".to_string()));
            }
            other => panic!("expected NoMatchingVersion, got {:?}", other),
        }
        assert!(!err.is_transient());
    }

    #[test]
    fn test_deprecated_and_preview_excluded_from_resolution() {
        // 1.17 only exists as deprecated, 1.19 only as preview
        assert!(resolve_version("1.17", &catalog(), None).is_err());
        assert!(resolve_version("1.19", &catalog(), None).is_err());
    }

    #[test]
    fn test_running_version_matching_request_kept_verbatim() {
        // Skip-on-equal happens before any catalog lookup, so a version
        // the catalog dropped entirely is still kept.
        let resolved = resolve_version("1.16.3", &[], Some("1.16.3")).unwrap();
        assert_eq!(resolved, "1.16.3");
    }

    #[test]
    fn test_never_downgrades_below_running_version() {
        // Request resolves to 1.18.1, but the cluster already runs higher
        let resolved = resolve_version("1.18", &catalog(), Some("1.18.4")).unwrap();
        assert_eq!(resolved, "1.18.4");

        // Even an explicit exact request below the running version keeps
        // the running one.
        let resolved = resolve_version("1.18.0", &catalog(), Some("1.18.1")).unwrap();
        assert_eq!(resolved, "1.18.1");
    }

    #[test]
    fn test_running_version_below_resolution_upgrades() {
        let resolved = resolve_version("1.18", &catalog(), Some("1.18.0")).unwrap();
        assert_eq!(resolved, "1.18.1");
    }

    #[test]
    fn test_unparseable_running_version_ignored_for_downgrade_check() {
        let resolved = resolve_version("1.18", &catalog(), Some("not-a-version")).unwrap();
        assert_eq!(resolved, "1.18.1");
    }

    #[test]
    fn test_malformed_catalog_entries_skipped() {
        let supported = vec![
            entry("garbage", LifecycleState::Supported),
            entry("1.18.1", LifecycleState::Supported),
        ];
        let resolved = resolve_version("1.18", &supported, None).unwrap();
        assert_eq!(resolved, "1.18.1");
    }

    #[test]
    fn test_malformed_request_is_a_validation_error() {
        let err = resolve_version("banana", &catalog(), None).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("banana"));
    }
}
