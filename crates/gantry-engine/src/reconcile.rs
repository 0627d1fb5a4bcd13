//! Reconciliation orchestrator
//!
//! Drives one cluster through the full pipeline: catalog fetch, version
//! resolution, normalization, validation, submission, stabilization
//! polling, and a final re-read. Writes are submitted exactly once per
//! invocation; when anything after submission fails, the error is
//! surfaced and the caller decides whether to invoke again. Only reads
//! (catalog, polling) are retried internally.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use gantry_common::model::{ClusterSpec, ObservedState, ProviderOptions};
use gantry_common::retry::RetryConfig;
use gantry_common::{Error, Result};

use crate::catalog::fetch_provider_options_or_skip;
use crate::client::ProvisionerClient;
use crate::defaults::{apply_pool_defaults, DefaultPolicy};
use crate::diff::cluster_changes;
use crate::transform::{observed_health, status_error_message, to_observed, to_wire};
use crate::validate::validate_cluster;
use crate::version::resolve_version;

/// Whether the caller intends to create a cluster or update one
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReconcileIntent {
    /// No previous state is known for this cluster
    Create,
    /// The cluster was reconciled before; an unchanged spec short-circuits
    Update,
}

/// Polling cadence and budget for waiting on cluster transitions
#[derive(Clone, Debug)]
pub struct PollConfig {
    /// Time between state reads
    pub interval: Duration,
    /// Total budget before giving up
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(45 * 60),
        }
    }
}

/// Drives desired cluster specs to reality on the provisioning service
pub struct Reconciler {
    client: Arc<dyn ProvisionerClient>,
    policy: DefaultPolicy,
    poll: PollConfig,
    catalog_retry: RetryConfig,
}

impl Reconciler {
    /// Create a reconciler with default policy, polling, and retry settings
    pub fn new(client: Arc<dyn ProvisionerClient>) -> Self {
        Self {
            client,
            policy: DefaultPolicy::default(),
            poll: PollConfig::default(),
            catalog_retry: RetryConfig::default(),
        }
    }

    /// Replace the default policy used for node pool normalization
    pub fn with_policy(mut self, policy: DefaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the polling configuration
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Replace the retry budget for catalog reads
    pub fn with_catalog_retry(mut self, retry: RetryConfig) -> Self {
        self.catalog_retry = retry;
        self
    }

    /// Reconcile a desired spec end to end
    ///
    /// Returns the observed state after the cluster stabilized. Updates
    /// whose diff against `previous` is empty return `previous` without
    /// touching the service.
    #[instrument(skip(self, spec, previous, cancel), fields(cluster = %spec.name, project = %spec.project_id, intent = ?intent))]
    pub async fn reconcile(
        &self,
        intent: ReconcileIntent,
        spec: &ClusterSpec,
        previous: Option<&ObservedState>,
        cancel: &CancellationToken,
    ) -> Result<ObservedState> {
        spec.validate()?;

        let options = fetch_provider_options_or_skip(
            self.client.as_ref(),
            &self.catalog_retry,
            &spec.project_id,
        )
        .await;

        let prepared = self.resolve_and_validate(spec, options.as_ref(), previous)?;

        if intent == ReconcileIntent::Update {
            if let Some(previous) = previous {
                let changes = cluster_changes(&prepared, previous);
                if changes.is_empty() {
                    info!("Cluster already matches desired state, skipping submission");
                    return Ok(previous.clone());
                }
                info!(
                    change_count = changes.len(),
                    changes = %changes,
                    "Cluster drifted from desired state"
                );
            }
        }

        let payload = to_wire(&prepared);
        self.client
            .create_or_update_cluster(&spec.project_id, &spec.name, &payload)
            .await?;

        self.wait_for_stable(&spec.project_id, &spec.name, cancel)
            .await?;

        self.refetch(&spec.project_id, &spec.name, previous).await
    }

    /// Delete a cluster and wait until it is gone
    ///
    /// A cluster that is already absent counts as success, both on the
    /// initial request and while polling.
    #[instrument(skip(self, cancel), fields(cluster = %name, project = %project_id))]
    pub async fn delete(
        &self,
        project_id: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.client.delete_cluster(project_id, name).await?;

        let start = Instant::now();
        loop {
            if start.elapsed() > self.poll.timeout {
                return Err(Error::timed_out(name, "deletion", start.elapsed()));
            }

            match self.client.get_cluster(project_id, name).await {
                Ok(None) => {
                    info!(waited_secs = start.elapsed().as_secs(), "Cluster deleted");
                    return Ok(());
                }
                Ok(Some(cluster)) => {
                    debug!(health = %observed_health(&cluster), "Cluster still deleting");
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Transient error reading cluster state, will poll again");
                }
                Err(e) => return Err(e),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::cancelled(name, "deletion")),
                _ = tokio::time::sleep(self.poll.interval) => {}
            }
        }
    }

    /// Adopt an existing cluster without changing it
    ///
    /// Reads current state and, when the cluster is stable, its
    /// credentials. A cluster mid-transition imports without them.
    #[instrument(skip(self), fields(cluster = %name, project = %project_id))]
    pub async fn import(&self, project_id: &str, name: &str) -> Result<ObservedState> {
        self.refetch(project_id, name, None).await
    }

    /// Resolve the version, fill pool defaults, and validate
    fn resolve_and_validate(
        &self,
        spec: &ClusterSpec,
        options: Option<&ProviderOptions>,
        previous: Option<&ObservedState>,
    ) -> Result<ClusterSpec> {
        let mut prepared = spec.clone();

        // Without a catalog the requested expression goes out verbatim
        // and the service resolves it.
        if let Some(options) = options {
            prepared.kubernetes_version = resolve_version(
                &spec.kubernetes_version,
                &options.kubernetes_versions,
                previous.map(|p| p.kubernetes_version.as_str()),
            )?;
        }

        for pool in &mut prepared.node_pools {
            apply_pool_defaults(pool, &self.policy);
        }

        validate_cluster(&prepared, options)
    }

    async fn wait_for_stable(
        &self,
        project_id: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let start = Instant::now();
        loop {
            if start.elapsed() > self.poll.timeout {
                return Err(Error::timed_out(name, "stabilization", start.elapsed()));
            }

            match self.client.get_cluster(project_id, name).await {
                Ok(Some(cluster)) => {
                    let health = observed_health(&cluster);
                    if health.is_failed() {
                        let detail = status_error_message(&cluster)
                            .unwrap_or_else(|| "provider reported a failed state".to_string());
                        return Err(Error::provider_permanent(name, "stabilization", detail));
                    }
                    if health.is_stable() {
                        info!(
                            health = %health,
                            waited_secs = start.elapsed().as_secs(),
                            "Cluster reached stable state"
                        );
                        return Ok(());
                    }
                    debug!(health = %health, "Cluster still transitioning");
                }
                Ok(None) => {
                    // A fresh cluster may briefly read as absent right
                    // after the create was accepted.
                    debug!("Cluster not visible yet");
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Transient error reading cluster state, will poll again");
                }
                Err(e) => return Err(e),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::cancelled(name, "stabilization")),
                _ = tokio::time::sleep(self.poll.interval) => {}
            }
        }
    }

    /// Re-read a cluster and build its observed state
    ///
    /// Credentials are attached only once the cluster is stable;
    /// fetching them mid-transition would hand out a bundle about to be
    /// rotated.
    async fn refetch(
        &self,
        project_id: &str,
        name: &str,
        previous: Option<&ObservedState>,
    ) -> Result<ObservedState> {
        let cluster = self
            .client
            .get_cluster(project_id, name)
            .await?
            .ok_or_else(|| Error::not_found(project_id, name))?;

        let mut observed = to_observed(project_id, &cluster, previous);

        if observed.is_stable() {
            observed.credentials = Some(self.client.get_credentials(project_id, name).await?);
        }

        Ok(observed)
    }
}
