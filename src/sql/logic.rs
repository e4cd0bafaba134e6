//! Structured view of the free-form `query_logic` mapping.

use crate::error::CompileError;
use serde_json::{Map, Value};

/// Single-level equi-join: `base.field = table.field`.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinConfig {
    pub table: String,
    pub field: String,
}

impl JoinConfig {
    pub fn parse(raw: &Map<String, Value>) -> Result<Self, CompileError> {
        let table = raw
            .get("table")
            .and_then(Value::as_str)
            .ok_or(CompileError::MissingJoinTable)?;
        let field = raw
            .get("field")
            .and_then(Value::as_str)
            .ok_or(CompileError::MissingJoinField)?;
        Ok(JoinConfig {
            table: table.to_string(),
            field: field.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryLogic {
    pub table: String,
    /// Field → equality value. Iteration order is not part of the contract.
    pub conditions: Map<String, Value>,
    pub join: Option<JoinConfig>,
}

/// Keys the join config may live under inside `query_logic`.
const JOIN_KEYS: [&str; 2] = ["join_config", "joinConfig"];

impl QueryLogic {
    /// Parse `query_logic`. An explicit `join` (from a query request body) takes precedence
    /// over one embedded in the mapping.
    pub fn parse(
        raw: &Map<String, Value>,
        join: Option<&Map<String, Value>>,
    ) -> Result<Self, CompileError> {
        let mut logic = Self::parse_unjoined(raw)?;
        logic.join = join
            .or_else(|| Self::embedded_join(raw))
            .map(JoinConfig::parse)
            .transpose()?;
        Ok(logic)
    }

    /// Table and conditions only. Update and delete never join, so an embedded join config is ignored.
    pub fn parse_unjoined(raw: &Map<String, Value>) -> Result<Self, CompileError> {
        let table = raw
            .get("table")
            .and_then(Value::as_str)
            .ok_or(CompileError::MissingTable)?
            .to_string();
        let conditions = match raw.get("conditions") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(m)) => m.clone(),
            Some(_) => return Err(CompileError::InvalidConditions),
        };
        Ok(QueryLogic {
            table,
            conditions,
            join: None,
        })
    }

    /// Embedded join config, if any, as the raw mapping the wire format carries.
    pub fn embedded_join(raw: &Map<String, Value>) -> Option<&Map<String, Value>> {
        JOIN_KEYS
            .iter()
            .find_map(|k| raw.get(*k))
            .and_then(Value::as_object)
    }
}
