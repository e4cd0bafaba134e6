//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failure to turn a declarative query description into a statement.
/// Always the caller's fault; nothing has been executed when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("table name not specified in query logic")]
    MissingTable,
    #[error("table name not specified in payload")]
    MissingPayloadTable,
    #[error("join table not specified")]
    MissingJoinTable,
    #[error("join field not specified")]
    MissingJoinField,
    #[error("conditions must be a JSON object")]
    InvalidConditions,
    #[error("invalid payload format: expected a JSON object")]
    InvalidPayload,
    #[error("invalid payload format: field '{0}' must be a scalar value")]
    NestedPayloadValue(String),
    #[error("update payload has no fields to set")]
    EmptyAssignment,
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("unknown table: '{0}'")]
    UnknownTable(String),
    #[error("unknown column: '{table}.{column}'")]
    UnknownColumn { table: String, column: String },
}

/// Failure to refresh the configuration snapshot from the control plane.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("fetching configs: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("non-success status from control plane: {0}")]
    Status(u16),
    #[error("decoding configs: {0}")]
    Decode(String),
    #[error("invalid setting {name}: {reason}")]
    Setting { name: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("tenant: {0}")]
    Tenant(String),
    #[error("{0}")]
    Upstream(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Compile(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Db(_) | AppError::Tenant(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_errors_are_client_facing() {
        let err = AppError::from(CompileError::MissingTable);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "table name not specified in query logic");
    }

    #[test]
    fn execution_errors_embed_the_cause() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("database: "));
    }

    #[test]
    fn timeouts_map_to_gateway_timeout() {
        let err = AppError::Timeout(Duration::from_secs(30));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.to_string(), "request timed out after 30s");
    }
}
