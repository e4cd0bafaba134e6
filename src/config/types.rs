//! Raw config types matching the control plane's JSON (api-configs and query bodies).

use axum::http::Method;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a tenant database file. The control plane sends it as a number
/// (`file_id`), but any string id is accepted. The wire form it arrived in is kept so
/// it goes back out unchanged; equality and hashing look at the id text only.
#[derive(Clone, Debug)]
pub struct TenantId {
    id: String,
    numeric: bool,
}

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        TenantId {
            id: id.into(),
            numeric: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Only ids made of `[A-Za-z0-9_-]` can name a database file.
    pub fn is_file_safe(&self) -> bool {
        !self.id.is_empty()
            && self
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl PartialEq for TenantId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TenantId {}

impl Hash for TenantId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl From<i64> for TenantId {
    fn from(n: i64) -> Self {
        TenantId {
            id: n.to_string(),
            numeric: true,
        }
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId::new(s)
    }
}

impl<'de> Deserialize<'de> for TenantId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(TenantId {
                id: n.to_string(),
                numeric: true,
            }),
            Value::String(s) => Ok(TenantId::new(s)),
            other => Err(serde::de::Error::custom(format!(
                "file_id must be a number or string; got {}",
                type_name_of_json(&other)
            ))),
        }
    }
}

impl Serialize for TenantId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.id.parse::<serde_json::Number>() {
            Ok(n) if self.numeric => n.serialize(serializer),
            _ => serializer.serialize_str(&self.id),
        }
    }
}

pub(crate) fn type_name_of_json(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declarative route definition as served by `GET /api-configs`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub id: i64,
    pub file_id: TenantId,
    pub endpoint_path: String,
    pub method: String,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub query_logic: Map<String, Value>,
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(m)) => Ok(m),
        Some(other) => Err(serde::de::Error::custom(format!(
            "query_logic must be an object; got {}",
            type_name_of_json(&other)
        ))),
    }
}

impl EndpointConfig {
    /// Upper-cased, trimmed verb.
    pub fn normalized_method(&self) -> String {
        self.method.trim().to_ascii_uppercase()
    }

    /// Path with a guaranteed leading slash.
    pub fn normalized_path(&self) -> String {
        let p = self.endpoint_path.trim();
        if p.starts_with('/') {
            p.to_string()
        } else {
            format!("/{}", p)
        }
    }
}

/// The four statement kinds a route can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

/// Verb → operation. Verbs not listed here are not routable.
const VERB_TABLE: [(&str, Operation); 4] = [
    ("GET", Operation::Select),
    ("POST", Operation::Insert),
    ("PUT", Operation::Update),
    ("DELETE", Operation::Delete),
];

impl Operation {
    pub fn from_verb(verb: &str) -> Option<Operation> {
        VERB_TABLE
            .iter()
            .find(|(v, _)| v.eq_ignore_ascii_case(verb.trim()))
            .map(|(_, op)| *op)
    }

    pub fn method(self) -> Method {
        match self {
            Operation::Select => Method::GET,
            Operation::Insert => Method::POST,
            Operation::Update => Method::PUT,
            Operation::Delete => Method::DELETE,
        }
    }

    /// Whether the HTTP handler must parse a JSON body.
    pub fn takes_payload(self) -> bool {
        match self {
            Operation::Insert | Operation::Update => true,
            Operation::Select | Operation::Delete => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /query` when execution is delegated to the control plane.
/// Also the input of the local executor, so both paths see the same request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub file_id: TenantId,
    #[serde(default)]
    pub sheet_name: Option<String>,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_logic: Option<Map<String, Value>>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub join_config: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_config_accepts_control_plane_shape() {
        let raw = json!({
            "id": 7,
            "file_id": 1,
            "endpoint_path": "users",
            "method": "get",
            "query_logic": {"table": "users"}
        });
        let cfg: EndpointConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(cfg.file_id.as_str(), "1");
        assert_eq!(cfg.normalized_path(), "/users");
        assert_eq!(cfg.normalized_method(), "GET");
        assert_eq!(cfg.query_logic["table"], "users");
    }

    #[test]
    fn null_query_logic_is_empty() {
        let raw = json!({"file_id": "t1", "endpoint_path": "/x", "method": "DELETE", "query_logic": null});
        let cfg: EndpointConfig = serde_json::from_value(raw).unwrap();
        assert!(cfg.query_logic.is_empty());
        assert_eq!(cfg.id, 0);
    }

    #[test]
    fn tenant_id_file_safety() {
        assert!(TenantId::from(42).is_file_safe());
        assert!(TenantId::from("tenant_a-1").is_file_safe());
        assert!(!TenantId::from("../etc/passwd").is_file_safe());
        assert!(!TenantId::from("").is_file_safe());
    }

    #[test]
    fn verbs_map_to_operations() {
        assert_eq!(Operation::from_verb("GET"), Some(Operation::Select));
        assert_eq!(Operation::from_verb("post"), Some(Operation::Insert));
        assert_eq!(Operation::from_verb("PUT"), Some(Operation::Update));
        assert_eq!(Operation::from_verb("DELETE"), Some(Operation::Delete));
        assert_eq!(Operation::from_verb("PATCH"), None);
        for op in [Operation::Select, Operation::Insert, Operation::Update, Operation::Delete] {
            assert_eq!(Operation::from_verb(op.method().as_str()), Some(op));
        }
    }

    #[test]
    fn query_request_wire_shape() {
        let req = QueryRequest {
            file_id: TenantId::from(3),
            sheet_name: None,
            operation: Operation::Insert,
            query_logic: None,
            payload: Some(json!({"table": "users", "name": "Ann"})),
            join_config: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["file_id"], 3);
        assert_eq!(v["operation"], "insert");
        assert!(v.get("query_logic").is_none());
        assert!(v["sheet_name"].is_null());
        assert!(v["join_config"].is_null());
    }

    #[test]
    fn tenant_id_keeps_its_wire_form() {
        let text: TenantId = serde_json::from_value(json!("007")).unwrap();
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("007"));
        let number: TenantId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(serde_json::to_value(&number).unwrap(), json!(7));
        assert_eq!(TenantId::from("7"), number);
        assert_ne!(text, number);
    }
}
