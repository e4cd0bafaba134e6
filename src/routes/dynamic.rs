//! Full application router: static common routes, with every other request dispatched through
//! the currently published route table.

use crate::handlers::dynamic::dispatch;
use crate::routes::common::common_routes;
use crate::state::AppState;
use axum::Router;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;

/// Per-request limits: the body size cap wraps the router, the timeout bounds each dispatch.
#[derive(Clone, Debug)]
pub struct RouterLimits {
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for RouterLimits {
    fn default() -> Self {
        RouterLimits {
            request_timeout: Duration::from_secs(30),
            max_body_bytes: 1024 * 1024,
        }
    }
}

pub fn dynamic_routes(state: AppState, limits: &RouterLimits) -> Router {
    common_routes()
        .fallback(dispatch)
        .with_state(state.with_request_timeout(limits.request_timeout))
        .layer(RequestBodyLimitLayer::new(limits.max_body_bytes))
}
