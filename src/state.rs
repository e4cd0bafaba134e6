//! Shared application state for all routes. The route table is republished on every config reload.

use crate::routing::RouteTableSwap;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTableSwap>,
    /// Upper bound on one configured endpoint's execution.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(routes: Arc<RouteTableSwap>) -> Self {
        AppState {
            routes,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
