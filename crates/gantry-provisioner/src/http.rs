//! HTTP client for the provisioning service
//!
//! Thin request/response layer: builds URLs, attaches auth, and maps
//! failures into the engine's error taxonomy. It never retries; retry
//! policy belongs to the caller, which knows whether an operation is a
//! read or a write.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use gantry_common::error::UNKNOWN_CONTEXT;
use gantry_common::model::{CredentialsBundle, ProviderOptions};
use gantry_common::{Error, Result};

use crate::wire::{WireCluster, WireCredentials};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the provisioning service
#[derive(Clone)]
pub struct ProvisionerConfig {
    /// Service base URL without a trailing slash
    pub base_url: String,
    /// Bearer token presented on every request
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ProvisionerConfig {
    /// Create a config with the default request timeout
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ProvisionerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionerConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[redacted]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Concrete client against a real provisioning service endpoint
#[derive(Clone, Debug)]
pub struct HttpProvisionerClient {
    http: reqwest::Client,
    config: ProvisionerConfig,
}

impl HttpProvisionerClient {
    /// Build a client from connection settings
    pub fn new(config: ProvisionerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::provider(format!("building http client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn options_url(&self, project_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/provider-options",
            self.config.base_url, project_id
        )
    }

    fn cluster_url(&self, project_id: &str, name: &str) -> String {
        format!(
            "{}/v1/projects/{}/clusters/{}",
            self.config.base_url, project_id, name
        )
    }

    fn credentials_url(&self, project_id: &str, name: &str) -> String {
        format!("{}/credentials", self.cluster_url(project_id, name))
    }

    /// Fetch the capability catalog for a project
    pub async fn get_provider_options(&self, project_id: &str) -> Result<ProviderOptions> {
        debug!(project = %project_id, "Fetching provider options");

        let resp = self
            .http
            .get(self.options_url(project_id))
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| {
                Error::provider_for(UNKNOWN_CONTEXT, "get_provider_options", e.to_string())
            })?;

        if !resp.status().is_success() {
            return Err(error_from_response("get_provider_options", UNKNOWN_CONTEXT, resp).await);
        }

        resp.json::<ProviderOptions>()
            .await
            .map_err(|e| Error::serialization(format!("decoding provider options: {}", e)))
    }

    /// Fetch a cluster's current state; `None` when it does not exist
    pub async fn get_cluster(&self, project_id: &str, name: &str) -> Result<Option<WireCluster>> {
        let resp = self
            .http
            .get(self.cluster_url(project_id, name))
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| Error::provider_for(name, "get_cluster", e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            return Err(error_from_response("get_cluster", name, resp).await);
        }

        let cluster = resp
            .json::<WireCluster>()
            .await
            .map_err(|e| Error::serialization(format!("decoding cluster {}: {}", name, e)))?;

        Ok(Some(cluster))
    }

    /// Submit a cluster payload; the service upserts by name
    pub async fn create_or_update_cluster(
        &self,
        project_id: &str,
        name: &str,
        cluster: &WireCluster,
    ) -> Result<()> {
        debug!(project = %project_id, cluster = %name, "Submitting cluster payload");

        let resp = self
            .http
            .put(self.cluster_url(project_id, name))
            .bearer_auth(&self.config.token)
            .json(cluster)
            .send()
            .await
            .map_err(|e| Error::provider_for(name, "create_or_update_cluster", e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_from_response("create_or_update_cluster", name, resp).await);
        }

        Ok(())
    }

    /// Request cluster deletion; a missing cluster counts as success
    pub async fn delete_cluster(&self, project_id: &str, name: &str) -> Result<()> {
        debug!(project = %project_id, cluster = %name, "Requesting cluster deletion");

        let resp = self
            .http
            .delete(self.cluster_url(project_id, name))
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| Error::provider_for(name, "delete_cluster", e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        if !resp.status().is_success() {
            return Err(error_from_response("delete_cluster", name, resp).await);
        }

        Ok(())
    }

    /// Fetch admin credentials for a cluster
    pub async fn get_credentials(
        &self,
        project_id: &str,
        name: &str,
    ) -> Result<CredentialsBundle> {
        let resp = self
            .http
            .get(self.credentials_url(project_id, name))
            .bearer_auth(&self.config.token)
            .send()
            .await
            .map_err(|e| Error::provider_for(name, "get_credentials", e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(project_id, name));
        }

        if !resp.status().is_success() {
            return Err(error_from_response("get_credentials", name, resp).await);
        }

        let creds = resp
            .json::<WireCredentials>()
            .await
            .map_err(|e| Error::serialization(format!("decoding credentials for {}: {}", name, e)))?;

        Ok(CredentialsBundle::new(creds.kubeconfig))
    }
}

async fn error_from_response(operation: &str, cluster: &str, resp: reqwest::Response) -> Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let detail = truncate_body(&body);

    let message = if detail.is_empty() {
        format!("http {}", status.as_u16())
    } else {
        format!("http {}: {}", status.as_u16(), detail)
    };

    Error::provider_with_status(
        cluster,
        operation,
        status.as_u16(),
        message,
        is_transient_status(status),
    )
}

// ============================================================================
// Pure Functions - Extracted for Unit Testability
// ============================================================================

/// Classify an HTTP status as safe to retry
///
/// Server errors and throttling are transient; every other non-success
/// status is a rejection the caller must not blindly repeat.
fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Cap error-body text so provider HTML error pages stay out of logs
fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 512;

    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX_CHARS).collect();
        format!("{}... (truncated)", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HttpProvisionerClient {
        let config = ProvisionerConfig::new("https://ske.example.com/", "test-token");
        HttpProvisionerClient::new(config).unwrap()
    }

    #[test]
    fn test_url_building_trims_trailing_slash() {
        let client = test_client();
        assert_eq!(
            client.options_url("p-1"),
            "https://ske.example.com/v1/projects/p-1/provider-options"
        );
        assert_eq!(
            client.cluster_url("p-1", "demo"),
            "https://ske.example.com/v1/projects/p-1/clusters/demo"
        );
        assert_eq!(
            client.credentials_url("p-1", "demo"),
            "https://ske.example.com/v1/projects/p-1/clusters/demo/credentials"
        );
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = ProvisionerConfig::new("https://ske.example.com", "super-secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("ske.example.com"));
    }

    #[test]
    fn test_config_timeout_override() {
        let config = ProvisionerConfig::new("https://ske.example.com", "t")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            ProvisionerConfig::new("https://ske.example.com", "t").timeout,
            DEFAULT_TIMEOUT
        );
    }

    #[test]
    fn test_transient_status_classification() {
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));

        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
        assert!(!is_transient_status(StatusCode::FORBIDDEN));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::CONFLICT));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("  short  "), "short");
        assert_eq!(truncate_body(""), "");

        let long = "x".repeat(2000);
        let truncated = truncate_body(&long);
        assert!(truncated.len() < 600);
        assert!(truncated.ends_with("... (truncated)"));
    }
}
