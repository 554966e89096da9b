//! Hosted object storage client.
//!
//! Talks to a Supabase-style storage REST API: objects are addressed as
//! `/object/{container}/{path}`, public containers serve reads under
//! `/object/public/...`, and restricted containers hand out time-limited
//! signed URLs via `/object/sign/...`. Uploads set `x-upsert` so repeated
//! writes to the same path overwrite instead of failing, which makes rapid
//! re-uploads with identical timestamps safe.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use propdoc_core::{Container, Error, ObjectStore, Result};

/// Default request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the hosted object store client.
#[derive(Debug, Clone)]
pub struct HostedObjectStoreConfig {
    /// Storage API root, e.g. `https://acme.supabase.co/storage/v1`.
    pub base_url: String,
    /// Service key sent as a bearer token.
    pub service_key: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HostedObjectStoreConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `PROPDOC_STORAGE_URL` | `http://localhost:54321/storage/v1` | Storage API root |
    /// | `PROPDOC_STORAGE_KEY` | empty | Service key |
    /// | `PROPDOC_STORAGE_TIMEOUT_SECS` | `30` | Request timeout |
    pub fn from_env() -> Self {
        let base_url = std::env::var("PROPDOC_STORAGE_URL")
            .unwrap_or_else(|_| "http://localhost:54321/storage/v1".to_string());
        let service_key = std::env::var("PROPDOC_STORAGE_KEY").unwrap_or_default();
        let timeout_secs = std::env::var("PROPDOC_STORAGE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            base_url,
            service_key,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Object store backed by a hosted storage REST API.
pub struct HostedObjectStore {
    client: Client,
    base_url: String,
    service_key: String,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl HostedObjectStore {
    pub fn new(config: HostedObjectStoreConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        info!(
            subsystem = "store",
            component = "object_store",
            op = "init",
            base_url = %config.base_url,
            "Initializing hosted object store client"
        );
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key,
        })
    }
}

#[async_trait]
impl ObjectStore for HostedObjectStore {
    async fn put(
        &self,
        container: Container,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()> {
        let url = format!("{}/object/{}/{}", self.base_url, container.name(), path);
        debug!(
            subsystem = "store",
            component = "object_store",
            op = "put",
            container = container.name(),
            object_path = %path,
            size = data.len(),
            "Uploading object"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| Error::StorageWrite(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(Error::StorageWrite(format!(
                "storage API returned {} for {}/{}",
                response.status(),
                container.name(),
                path
            )));
        }
        Ok(())
    }

    async fn issue_access_url(
        &self,
        container: Container,
        path: &str,
        ttl: Option<Duration>,
    ) -> Result<String> {
        let ttl = match ttl {
            None => {
                return Ok(format!(
                    "{}/object/public/{}/{}",
                    self.base_url,
                    container.name(),
                    path
                ))
            }
            Some(ttl) => ttl,
        };

        let url = format!("{}/object/sign/{}/{}", self.base_url, container.name(), path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "expiresIn": ttl.as_secs() }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "signing {}/{} failed with {}",
                container.name(),
                path,
                response.status()
            )));
        }

        let signed: SignResponse = response.json().await?;
        if signed.signed_url.starts_with('/') {
            Ok(format!("{}{}", self.base_url, signed.signed_url))
        } else {
            Ok(format!("{}/{}", self.base_url, signed.signed_url))
        }
    }

    async fn remove(&self, container: Container, paths: &[String]) -> Result<()> {
        let url = format!("{}/object/{}", self.base_url, container.name());
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "removing {} object(s) from {} failed with {}",
                paths.len(),
                container.name(),
                response.status()
            )));
        }
        Ok(())
    }
}
