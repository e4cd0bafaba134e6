//! Where a bound route sends its query: compile and run locally, or delegate to the control plane.

use crate::config::QueryRequest;
use crate::error::AppError;
use crate::service::gateway::DatabaseGateway;
use crate::sql::compile;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: QueryRequest) -> Result<Value, AppError>;
}

/// Compiles the request and runs it against the tenant's database file.
#[derive(Clone)]
pub struct LocalExecutor {
    gateway: DatabaseGateway,
}

impl LocalExecutor {
    pub fn new(gateway: DatabaseGateway) -> Self {
        LocalExecutor { gateway }
    }

    pub fn gateway(&self) -> &DatabaseGateway {
        &self.gateway
    }
}

#[async_trait]
impl QueryExecutor for LocalExecutor {
    async fn execute(&self, request: QueryRequest) -> Result<Value, AppError> {
        let q = compile(
            request.operation,
            request.query_logic.as_ref(),
            request.join_config.as_ref(),
            request.payload.as_ref(),
        )?;
        let outcome = self.gateway.execute(&request.file_id, &q).await?;
        Ok(outcome.into_json())
    }
}

/// Posts the request to the control plane's query endpoint and relays its JSON answer.
#[derive(Clone)]
pub struct RemoteExecutor {
    client: reqwest::Client,
    url: String,
}

impl RemoteExecutor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Upstream(format!("building query client: {}", e)))?;
        Ok(RemoteExecutor {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl QueryExecutor for RemoteExecutor {
    async fn execute(&self, request: QueryRequest) -> Result<Value, AppError> {
        tracing::debug!(url = %self.url, tenant = %request.file_id, operation = %request.operation, "delegating query");
        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to execute query: {}", e)))?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp
                .text()
                .await
                .map_err(|e| AppError::Upstream(format!("failed to read error body: {}", e)))?;
            return Err(AppError::Upstream(format!(
                "query failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to decode response: {}", e)))
    }
}
