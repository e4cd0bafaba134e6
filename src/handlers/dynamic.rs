//! Dispatch for configured endpoints: look up (verb, path) in the published table and run its handler.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, Uri},
    Json,
};
use serde_json::Value;

pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let path = uri.path();
    let handler = state
        .routes
        .table()
        .get(&method, path)
        .ok_or_else(|| AppError::NotFound(format!("no route for {} {}", method, path)))?;
    let payload = if handler.operation.takes_payload() {
        let value: Value = serde_json::from_slice(&body)
            .map_err(|_| AppError::BadRequest("invalid payload".into()))?;
        Some(value)
    } else {
        None
    };
    tracing::debug!(config_id = handler.config_id, tenant = %handler.tenant, operation = %handler.operation, "dispatch");
    let out = tokio::time::timeout(state.request_timeout, handler.invoke(payload))
        .await
        .map_err(|_| AppError::Timeout(state.request_timeout))??;
    Ok(Json(out))
}
