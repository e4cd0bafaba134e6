//! Example consumer: serves endpoint configs read from a JSON file, re-reading it when it changes.
//!
//! Run from repo root: `CONFIG_FILE=configs.json DATA_DIR=data cargo run -p example-consumer`

use autoapi_gateway::config::{load_snapshot_file, PoolSettings};
use autoapi_gateway::{
    dynamic_routes, AppState, DatabaseGateway, LocalExecutor, Reloader, RouteTableBuilder,
    RouteTableSwap, RouterLimits, TenantPools,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("autoapi_gateway=info,example_consumer=info")),
        )
        .init();

    let config_file = PathBuf::from(std::env::var("CONFIG_FILE").unwrap_or_else(|_| "configs.json".into()));
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".into());

    let pools = Arc::new(TenantPools::new(data_dir, PoolSettings::default()));
    let executor = Arc::new(LocalExecutor::new(DatabaseGateway::new(pools)));
    let swap = Arc::new(RouteTableSwap::new());
    let reloader = Reloader::new(RouteTableBuilder::new(executor), swap.clone());

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(reloader.run_push(rx));
    tokio::spawn(async move {
        let mut seen: Option<SystemTime> = None;
        let mut ticker = tokio::time::interval(Duration::from_secs(2));
        loop {
            ticker.tick().await;
            let modified = match tokio::fs::metadata(&config_file).await.and_then(|m| m.modified()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = %config_file.display(), error = %e, "config file not readable");
                    continue;
                }
            };
            if seen == Some(modified) {
                continue;
            }
            match load_snapshot_file(&config_file).await {
                Ok(snapshot) => {
                    seen = Some(modified);
                    if tx.send(snapshot).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "config file rejected, keeping current routes"),
            }
        }
    });

    let app = dynamic_routes(AppState::new(swap), &RouterLimits::default());
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
