//! Shared utilities for integration tests.
#![allow(dead_code)]

use autoapi_gateway::config::PoolSettings;
use autoapi_gateway::{
    dynamic_routes, AppState, DatabaseGateway, EndpointConfig, LocalExecutor, QueryExecutor,
    Reloader, RouteTableBuilder, RouteTableSwap, RouterLimits, TenantPools,
};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const USERS_DDL: &str =
    "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, a INTEGER, b INTEGER, avatar BLOB)";
pub const ORDERS_DDL: &str = "CREATE TABLE orders (order_id INTEGER PRIMARY KEY, id INTEGER, item TEXT)";

/// Create `<dir>/<tenant>.db` and run `statements` against it.
pub async fn tenant_db(dir: &Path, tenant: &str, statements: &[&str]) {
    let opts = SqliteConnectOptions::new()
        .filename(dir.join(format!("{}.db", tenant)))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    for stmt in statements {
        sqlx::query(stmt).execute(&pool).await.unwrap();
    }
    pool.close().await;
}

pub fn local_executor(dir: &Path, max_connections: u32) -> LocalExecutor {
    let pools = Arc::new(TenantPools::new(
        dir,
        PoolSettings {
            max_connections,
            ..PoolSettings::default()
        },
    ));
    LocalExecutor::new(DatabaseGateway::new(pools))
}

pub fn config(id: i64, method: &str, path: &str, tenant: i64, logic: Value) -> EndpointConfig {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "file_id": tenant,
        "endpoint_path": path,
        "method": method,
        "query_logic": logic,
    }))
    .unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub swap: Arc<RouteTableSwap>,
    pub reloader: Reloader,
}

pub fn app(executor: Arc<dyn QueryExecutor>, snapshot: Vec<EndpointConfig>) -> TestApp {
    let swap = Arc::new(RouteTableSwap::new());
    let reloader = Reloader::new(RouteTableBuilder::new(executor), swap.clone());
    reloader.apply(snapshot);
    let router = dynamic_routes(AppState::new(swap.clone()), &RouterLimits::default());
    TestApp {
        router,
        swap,
        reloader,
    }
}

/// Send one request through the router and decode the JSON response.
pub async fn send(router: &Router, method: &str, path: &str, body: Option<&str>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}
