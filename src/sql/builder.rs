//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from declarative query logic.

use crate::config::Operation;
use crate::error::CompileError;
use crate::sql::ident::{check_identifier, quoted};
use crate::sql::logic::QueryLogic;
use serde_json::{Map, Value};

/// A column a statement reads or writes, for allow-listing against the tenant schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

/// Compiled statement: text with `?N` placeholders, values in placeholder order,
/// and every identifier the text interpolates.
#[derive(Clone, Debug)]
pub struct QueryBuf {
    pub operation: Operation,
    pub sql: String,
    pub params: Vec<Value>,
    pub tables: Vec<String>,
    pub columns: Vec<ColumnRef>,
}

impl QueryBuf {
    fn new(operation: Operation) -> Self {
        QueryBuf {
            operation,
            sql: String::new(),
            params: Vec::new(),
            tables: Vec::new(),
            columns: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }

    fn table(&mut self, name: &str) -> Result<String, CompileError> {
        check_identifier(name)?;
        if !self.tables.iter().any(|t| t == name) {
            self.tables.push(name.to_string());
        }
        Ok(quoted(name))
    }

    fn column(&mut self, table: &str, column: &str) -> Result<String, CompileError> {
        check_identifier(column)?;
        self.columns.push(ColumnRef {
            table: table.to_string(),
            column: column.to_string(),
        });
        Ok(quoted(column))
    }

    /// ` WHERE a = ?n AND b = ?m`, or nothing when there are no conditions.
    /// With `qualify`, columns are prefixed with the table so a join cannot make them ambiguous.
    fn push_where(
        &mut self,
        table: &str,
        conditions: &Map<String, Value>,
        qualify: bool,
    ) -> Result<(), CompileError> {
        let mut preds = Vec::with_capacity(conditions.len());
        for (field, value) in conditions {
            let col = self.column(table, field)?;
            let lhs = if qualify {
                format!("{}.{}", quoted(table), col)
            } else {
                col
            };
            let n = self.push_param(value.clone());
            preds.push(format!("{} = ?{}", lhs, n));
        }
        if !preds.is_empty() {
            self.sql.push_str(" WHERE ");
            self.sql.push_str(&preds.join(" AND "));
        }
        Ok(())
    }
}

/// Compile one operation. `logic` is the route's `query_logic`; `join` an explicit join config
/// (delegated query bodies carry it separately); `payload` the request body for insert/update.
pub fn compile(
    operation: Operation,
    logic: Option<&Map<String, Value>>,
    join: Option<&Map<String, Value>>,
    payload: Option<&Value>,
) -> Result<QueryBuf, CompileError> {
    let empty = Map::new();
    let raw = logic.unwrap_or(&empty);
    match operation {
        Operation::Select => select(&QueryLogic::parse(raw, join)?),
        Operation::Insert => insert(flat_payload(payload)?),
        Operation::Update => update(&QueryLogic::parse_unjoined(raw)?, flat_payload(payload)?),
        Operation::Delete => delete(&QueryLogic::parse_unjoined(raw)?),
    }
}

/// SELECT * with optional inner join and equality filters.
pub fn select(logic: &QueryLogic) -> Result<QueryBuf, CompileError> {
    let mut q = QueryBuf::new(Operation::Select);
    let base = q.table(&logic.table)?;
    q.sql = format!("SELECT * FROM {}", base);
    if let Some(join) = &logic.join {
        let other = q.table(&join.table)?;
        let left = q.column(&logic.table, &join.field)?;
        let right = q.column(&join.table, &join.field)?;
        q.sql.push_str(&format!(
            " INNER JOIN {} ON {}.{} = {}.{}",
            other, base, left, other, right
        ));
    }
    q.push_where(&logic.table, &logic.conditions, logic.join.is_some())?;
    Ok(q)
}

/// INSERT from a flat payload; the `table` key names the relation, every other key is a column.
pub fn insert(payload: &Map<String, Value>) -> Result<QueryBuf, CompileError> {
    let table = payload
        .get("table")
        .and_then(Value::as_str)
        .ok_or(CompileError::MissingPayloadTable)?;
    let mut q = QueryBuf::new(Operation::Insert);
    let target = q.table(table)?;
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (field, value) in payload.iter().filter(|(k, _)| k.as_str() != "table") {
        cols.push(q.column(table, field)?);
        let n = q.push_param(value.clone());
        placeholders.push(format!("?{}", n));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", target)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            target,
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    Ok(q)
}

/// UPDATE: payload fields (minus `table`) are SET, conditions are the WHERE.
/// An update with nothing to set is rejected rather than run as a no-op.
pub fn update(logic: &QueryLogic, payload: &Map<String, Value>) -> Result<QueryBuf, CompileError> {
    let mut q = QueryBuf::new(Operation::Update);
    let target = q.table(&logic.table)?;
    let mut sets = Vec::new();
    for (field, value) in payload.iter().filter(|(k, _)| k.as_str() != "table") {
        let col = q.column(&logic.table, field)?;
        let n = q.push_param(value.clone());
        sets.push(format!("{} = ?{}", col, n));
    }
    if sets.is_empty() {
        return Err(CompileError::EmptyAssignment);
    }
    q.sql = format!("UPDATE {} SET {}", target, sets.join(", "));
    q.push_where(&logic.table, &logic.conditions, false)?;
    Ok(q)
}

/// DELETE with conditions from query logic only.
pub fn delete(logic: &QueryLogic) -> Result<QueryBuf, CompileError> {
    let mut q = QueryBuf::new(Operation::Delete);
    let target = q.table(&logic.table)?;
    q.sql = format!("DELETE FROM {}", target);
    q.push_where(&logic.table, &logic.conditions, false)?;
    Ok(q)
}

/// Payload must be an object whose values are all scalars.
fn flat_payload(payload: Option<&Value>) -> Result<&Map<String, Value>, CompileError> {
    let map = payload
        .and_then(Value::as_object)
        .ok_or(CompileError::InvalidPayload)?;
    if let Some((field, _)) = map
        .iter()
        .find(|(_, v)| matches!(v, Value::Object(_) | Value::Array(_)))
    {
        return Err(CompileError::NestedPayloadValue(field.clone()));
    }
    Ok(map)
}
