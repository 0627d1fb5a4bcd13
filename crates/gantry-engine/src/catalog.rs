//! Capability catalog fetch
//!
//! Catalog reads go through backoff because they are idempotent. An
//! exhausted budget degrades to "no catalog": reconciliation proceeds
//! without client-side validation and the provisioning service stays
//! the final authority on the payload.

use tracing::warn;

use gantry_common::model::ProviderOptions;
use gantry_common::retry::{retry_with_backoff, RetryConfig};
use gantry_common::{Error, Result};

use crate::client::ProvisionerClient;

/// Fetch the capability catalog for a project, retrying transient failures
pub async fn fetch_provider_options(
    client: &dyn ProvisionerClient,
    retry: &RetryConfig,
    project_id: &str,
) -> Result<ProviderOptions> {
    retry_with_backoff(retry, "get_provider_options", || {
        client.get_provider_options(project_id)
    })
    .await
    .map_err(|e| Error::catalog_unavailable(project_id, e.to_string()))
}

/// Fetch the capability catalog, degrading to `None` on failure
pub async fn fetch_provider_options_or_skip(
    client: &dyn ProvisionerClient,
    retry: &RetryConfig,
    project_id: &str,
) -> Option<ProviderOptions> {
    match fetch_provider_options(client, retry, project_id).await {
        Ok(options) => Some(options),
        Err(e) => {
            warn!(
                project = %project_id,
                error = %e,
                "Capability catalog unavailable, skipping catalog validation"
            );
            None
        }
    }
}
