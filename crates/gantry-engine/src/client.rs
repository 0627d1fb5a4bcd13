//! Provisioning service abstraction used by the engine

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use gantry_common::model::{CredentialsBundle, ProviderOptions};
use gantry_common::Result;
use gantry_provisioner::wire::WireCluster;
use gantry_provisioner::HttpProvisionerClient;

/// Trait abstracting provisioning service operations
///
/// This trait allows mocking the service in tests while the HTTP client
/// talks to the real endpoint in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProvisionerClient: Send + Sync {
    /// Fetch the capability catalog for a project
    async fn get_provider_options(&self, project_id: &str) -> Result<ProviderOptions>;

    /// Fetch a cluster's current state; `None` when it does not exist
    async fn get_cluster(&self, project_id: &str, name: &str) -> Result<Option<WireCluster>>;

    /// Submit a cluster payload; the service upserts by name
    async fn create_or_update_cluster(
        &self,
        project_id: &str,
        name: &str,
        cluster: &WireCluster,
    ) -> Result<()>;

    /// Request cluster deletion; a missing cluster counts as success
    async fn delete_cluster(&self, project_id: &str, name: &str) -> Result<()>;

    /// Fetch admin credentials for a cluster
    async fn get_credentials(&self, project_id: &str, name: &str) -> Result<CredentialsBundle>;
}

#[async_trait]
impl ProvisionerClient for HttpProvisionerClient {
    async fn get_provider_options(&self, project_id: &str) -> Result<ProviderOptions> {
        HttpProvisionerClient::get_provider_options(self, project_id).await
    }

    async fn get_cluster(&self, project_id: &str, name: &str) -> Result<Option<WireCluster>> {
        HttpProvisionerClient::get_cluster(self, project_id, name).await
    }

    async fn create_or_update_cluster(
        &self,
        project_id: &str,
        name: &str,
        cluster: &WireCluster,
    ) -> Result<()> {
        HttpProvisionerClient::create_or_update_cluster(self, project_id, name, cluster).await
    }

    async fn delete_cluster(&self, project_id: &str, name: &str) -> Result<()> {
        HttpProvisionerClient::delete_cluster(self, project_id, name).await
    }

    async fn get_credentials(&self, project_id: &str, name: &str) -> Result<CredentialsBundle> {
        HttpProvisionerClient::get_credentials(self, project_id, name).await
    }
}
