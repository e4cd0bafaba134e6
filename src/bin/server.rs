//! Gateway server: polls the control plane for endpoint configs and serves them against tenant files in DATA_DIR.

use autoapi_gateway::{
    dynamic_routes, AppState, ConfigPoller, DatabaseGateway, ExecutionMode, HttpConfigSource,
    LocalExecutor, QueryExecutor, Reloader, RemoteExecutor, RouteTableBuilder, RouteTableSwap,
    RouterLimits, Settings, TenantPools,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const CONTROL_PLANE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("autoapi_gateway=info,autoapi_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let pools = Arc::new(TenantPools::new(&settings.data_dir, settings.pool.clone()));
    let executor: Arc<dyn QueryExecutor> = match settings.execution_mode {
        ExecutionMode::Local => Arc::new(LocalExecutor::new(DatabaseGateway::new(pools.clone()))),
        ExecutionMode::Remote => Arc::new(RemoteExecutor::new(settings.query_url(), CONTROL_PLANE_TIMEOUT)?),
    };

    let swap = Arc::new(RouteTableSwap::new());
    let reloader = Reloader::new(RouteTableBuilder::new(executor), swap.clone());
    let source = HttpConfigSource::new(settings.configs_url(), CONTROL_PLANE_TIMEOUT)?;
    tracing::info!(url = %source.url(), mode = ?settings.execution_mode, "polling control plane");
    tokio::spawn(ConfigPoller::new(source, reloader, settings.poll_interval).run());

    if settings.execution_mode == ExecutionMode::Local {
        let pools = pools.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(pools.idle_timeout());
            loop {
                ticker.tick().await;
                let closed = pools.evict_idle();
                if closed > 0 {
                    tracing::debug!(closed, "evicted idle tenant pools");
                }
            }
        });
    }

    let limits = RouterLimits {
        request_timeout: settings.request_timeout,
        max_body_bytes: settings.max_body_bytes,
    };
    let app = dynamic_routes(AppState::new(swap), &limits);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
