//! Where configuration snapshots come from.

use crate::config::{decode_snapshot, EndpointConfig};
use crate::error::ConfigError;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the full current list of endpoint configs.
    async fn fetch(&self) -> Result<Vec<EndpointConfig>, ConfigError>;
}

/// `GET <control plane>/api-configs`.
pub struct HttpConfigSource {
    client: reqwest::Client,
    url: String,
}

impl HttpConfigSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpConfigSource {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SnapshotSource for HttpConfigSource {
    async fn fetch(&self) -> Result<Vec<EndpointConfig>, ConfigError> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(ConfigError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        decode_snapshot(&body)
    }
}
