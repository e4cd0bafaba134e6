//! Decode configuration snapshots from control-plane bodies or files on disk.

use crate::config::types::EndpointConfig;
use crate::error::ConfigError;
use std::path::Path;

/// Decode a `GET /api-configs` body. A `null` body is an empty snapshot.
pub fn decode_snapshot(body: &[u8]) -> Result<Vec<EndpointConfig>, ConfigError> {
    let configs: Option<Vec<EndpointConfig>> =
        serde_json::from_slice(body).map_err(|e| ConfigError::Decode(e.to_string()))?;
    Ok(configs.unwrap_or_default())
}

/// Load a snapshot from a JSON file holding the same array the control plane serves.
pub async fn load_snapshot_file(path: &Path) -> Result<Vec<EndpointConfig>, ConfigError> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|e| ConfigError::Decode(format!("{}: {}", path.display(), e)))?;
    decode_snapshot(&body)
}
