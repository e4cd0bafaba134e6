//! Route table: immutable (verb, path) → bound handler map, rebuilt wholesale from each snapshot.

use crate::config::{EndpointConfig, Operation, QueryRequest, TenantId};
use crate::error::AppError;
use crate::service::QueryExecutor;
use crate::sql::{compile, QueryLogic};
use axum::http::Method;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const HEALTH_PATH: &str = "/health";
pub const VERSION_PATH: &str = "/version";

/// `GET` on these paths is served by the router itself; configuration cannot claim it.
/// Other verbs on them dispatch like any configured route.
pub const RESERVED_GET_PATHS: [&str; 2] = [HEALTH_PATH, VERSION_PATH];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        RouteKey {
            method,
            path: path.into(),
        }
    }

    fn is_reserved(&self) -> bool {
        self.method == Method::GET && RESERVED_GET_PATHS.contains(&self.path.as_str())
    }
}

/// One configured endpoint: its tenant, operation, and query logic, plus where to run it.
pub struct BoundHandler {
    pub config_id: i64,
    pub tenant: TenantId,
    pub operation: Operation,
    pub query_logic: Arc<Map<String, Value>>,
    executor: Arc<dyn QueryExecutor>,
}

impl BoundHandler {
    /// The query this endpoint runs for `payload`. Inserts take their table from the payload,
    /// so query logic is not sent with them.
    pub fn request(&self, payload: Option<Value>) -> QueryRequest {
        let logic = (*self.query_logic).clone();
        let (query_logic, join_config) = match self.operation {
            Operation::Select => {
                let join = QueryLogic::embedded_join(&logic).cloned();
                (Some(logic), join)
            }
            Operation::Insert => (None, None),
            Operation::Update | Operation::Delete => (Some(logic), None),
        };
        QueryRequest {
            file_id: self.tenant.clone(),
            sheet_name: None,
            operation: self.operation,
            query_logic,
            payload: if self.operation.takes_payload() { payload } else { None },
            join_config,
        }
    }

    pub async fn invoke(&self, payload: Option<Value>) -> Result<Value, AppError> {
        self.executor.execute(self.request(payload)).await
    }
}

#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<RouteKey, Arc<BoundHandler>>,
}

impl RouteTable {
    pub fn get(&self, method: &Method, path: &str) -> Option<Arc<BoundHandler>> {
        self.routes
            .get(&RouteKey::new(method.clone(), path))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.routes.keys()
    }
}

pub struct RouteTableBuilder {
    executor: Arc<dyn QueryExecutor>,
}

impl RouteTableBuilder {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        RouteTableBuilder { executor }
    }

    /// Build a fresh table from `snapshot`, in snapshot order. The first config for a key wins.
    pub fn build(&self, snapshot: &[EndpointConfig]) -> RouteTable {
        let mut routes = HashMap::with_capacity(snapshot.len());
        for cfg in snapshot {
            let verb = cfg.normalized_method();
            let Some(operation) = Operation::from_verb(&verb) else {
                tracing::warn!(config_id = cfg.id, method = %verb, "unsupported method, skipping config");
                continue;
            };
            let key = RouteKey::new(operation.method(), cfg.normalized_path());
            if key.is_reserved() {
                tracing::warn!(config_id = cfg.id, path = %key.path, "path is reserved, skipping config");
                continue;
            }
            if routes.contains_key(&key) {
                tracing::warn!(
                    config_id = cfg.id,
                    method = %key.method,
                    path = %key.path,
                    "duplicate route, keeping first definition"
                );
                continue;
            }
            warn_if_uncompilable(cfg, operation);
            let handler = BoundHandler {
                config_id: cfg.id,
                tenant: cfg.file_id.clone(),
                operation,
                query_logic: Arc::new(cfg.query_logic.clone()),
                executor: self.executor.clone(),
            };
            routes.insert(key, Arc::new(handler));
        }
        RouteTable { routes }
    }
}

/// Compile errors surface per request; this only gives operators an early hint at reload time.
fn warn_if_uncompilable(cfg: &EndpointConfig, operation: Operation) {
    let probe = match operation {
        Operation::Select | Operation::Delete => compile(operation, Some(&cfg.query_logic), None, None).err(),
        Operation::Update => QueryLogic::parse_unjoined(&cfg.query_logic).err(),
        Operation::Insert => None,
    };
    if let Some(err) = probe {
        tracing::warn!(config_id = cfg.id, path = %cfg.endpoint_path, error = %err, "query logic will not compile");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Echoes the request so tests can see which config answered.
    struct Echo;

    #[async_trait]
    impl QueryExecutor for Echo {
        async fn execute(&self, request: QueryRequest) -> Result<Value, AppError> {
            Ok(serde_json::to_value(request).unwrap())
        }
    }

    fn cfg(id: i64, method: &str, path: &str, tenant: i64, logic: Value) -> EndpointConfig {
        serde_json::from_value(json!({
            "id": id,
            "file_id": tenant,
            "endpoint_path": path,
            "method": method,
            "query_logic": logic,
        }))
        .unwrap()
    }

    fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new(Arc::new(Echo))
    }

    #[tokio::test]
    async fn first_duplicate_wins() {
        let table = builder().build(&[
            cfg(1, "GET", "/users", 1, json!({"table": "users"})),
            cfg(2, "GET", "/users", 2, json!({"table": "people"})),
        ]);
        assert_eq!(table.len(), 1);
        let h = table.get(&Method::GET, "/users").unwrap();
        assert_eq!(h.config_id, 1);
        let out = h.invoke(None).await.unwrap();
        assert_eq!(out["file_id"], 1);
        assert_eq!(out["query_logic"]["table"], "users");
    }

    #[test]
    fn same_path_different_verbs_coexist() {
        let table = builder().build(&[
            cfg(1, "GET", "/users", 1, json!({"table": "users"})),
            cfg(2, "post", "users", 1, json!({})),
            cfg(3, "DELETE", "/users", 1, json!({"table": "users"})),
        ]);
        assert_eq!(table.len(), 3);
        assert!(table.get(&Method::POST, "/users").is_some());
    }

    #[test]
    fn unsupported_verbs_and_reserved_paths_are_skipped() {
        let table = builder().build(&[
            cfg(1, "PATCH", "/users", 1, json!({"table": "users"})),
            cfg(2, "GET", "/health", 1, json!({"table": "users"})),
            cfg(3, "GET", "/version", 1, json!({"table": "users"})),
        ]);
        assert!(table.is_empty());
    }

    #[test]
    fn other_verbs_on_reserved_paths_are_registered() {
        let table = builder().build(&[
            cfg(1, "POST", "/health", 1, json!({})),
            cfg(2, "DELETE", "/version", 1, json!({"table": "users"})),
        ]);
        assert_eq!(table.len(), 2);
        assert!(table.get(&Method::POST, "/health").is_some());
        assert!(table.get(&Method::DELETE, "/version").is_some());
    }

    #[test]
    fn uncompilable_logic_is_still_registered() {
        let table = builder().build(&[cfg(1, "GET", "/broken", 1, json!({}))]);
        assert!(table.get(&Method::GET, "/broken").is_some());
    }

    #[test]
    fn requests_follow_the_operation() {
        let table = builder().build(&[
            cfg(1, "GET", "/j", 1, json!({"table": "a", "join_config": {"table": "b", "field": "k"}})),
            cfg(2, "POST", "/p", 1, json!({"table": "a"})),
            cfg(3, "DELETE", "/d", 1, json!({"table": "a"})),
        ]);
        let get = table.get(&Method::GET, "/j").unwrap().request(Some(json!({"x": 1})));
        assert_eq!(get.join_config.unwrap()["table"], "b");
        assert!(get.payload.is_none());
        let post = table.get(&Method::POST, "/p").unwrap().request(Some(json!({"table": "a"})));
        assert!(post.query_logic.is_none());
        assert!(post.payload.is_some());
        let del = table.get(&Method::DELETE, "/d").unwrap().request(Some(json!({"x": 1})));
        assert!(del.payload.is_none());
        assert_eq!(del.query_logic.unwrap()["table"], "a");
    }
}
