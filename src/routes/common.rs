//! Common routes: health and version. Other verbs on these paths fall through to the route table.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::handlers::dynamic::dispatch;
use crate::routing::{HEALTH_PATH, VERSION_PATH};
use crate::state::AppState;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "healthy" })
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health and GET /version.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route(HEALTH_PATH, get(health).fallback(dispatch))
        .route(VERSION_PATH, get(version).fallback(dispatch))
}
