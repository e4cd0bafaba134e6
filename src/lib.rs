//! AutoAPI gateway: REST endpoints defined by control-plane configs, served against per-tenant SQLite files
//! and hot-swapped on every config refresh.

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod reload;
pub mod routes;
pub mod routing;
pub mod service;
pub mod sql;
pub mod state;
pub mod tenant;

pub use config::{EndpointConfig, ExecutionMode, Operation, QueryRequest, Settings, TenantId};
pub use error::{AppError, CompileError, ConfigError};
pub use reload::{ConfigPoller, HttpConfigSource, Reloader, SnapshotSource};
pub use routes::{common_routes, dynamic_routes, RouterLimits};
pub use routing::{RouteTable, RouteTableBuilder, RouteTableSwap};
pub use service::{DatabaseGateway, LocalExecutor, QueryExecutor, RemoteExecutor};
pub use state::AppState;
pub use tenant::TenantPools;
