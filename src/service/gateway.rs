//! Executes compiled statements against a tenant's SQLite file.

use crate::config::{Operation, TenantId};
use crate::error::AppError;
use crate::sql::{QueryBuf, SqliteBindValue};
use crate::tenant::{TenantHandle, TenantPools};
use serde_json::{json, Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;
use std::sync::Arc;

/// Result of one statement before it is rendered as a response body.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Map<String, Value>>),
    Inserted { id: i64 },
    Affected { operation: Operation, rows: u64 },
}

impl QueryOutcome {
    pub fn into_json(self) -> Value {
        match self {
            QueryOutcome::Rows(rows) => Value::Array(rows.into_iter().map(Value::Object).collect()),
            QueryOutcome::Inserted { id } => json!({
                "id": id,
                "message": "Record inserted successfully",
            }),
            QueryOutcome::Affected { operation, rows } => {
                let message = match operation {
                    Operation::Update => "Records updated successfully",
                    _ => "Records deleted successfully",
                };
                json!({ "rows_affected": rows, "message": message })
            }
        }
    }
}

#[derive(Clone)]
pub struct DatabaseGateway {
    pools: Arc<TenantPools>,
}

impl DatabaseGateway {
    pub fn new(pools: Arc<TenantPools>) -> Self {
        DatabaseGateway { pools }
    }

    pub fn pools(&self) -> &Arc<TenantPools> {
        &self.pools
    }

    /// Validate identifiers against the tenant's catalog, then run the statement.
    /// The connection goes back to the pool on every path out of this function.
    pub async fn execute(&self, tenant: &TenantId, q: &QueryBuf) -> Result<QueryOutcome, AppError> {
        let handle = self.pools.get(tenant).await?;
        let mut conn = handle.pool.acquire().await?;
        Self::check_identifiers(&handle, &mut conn, q).await?;
        tracing::debug!(tenant = %tenant, sql = %q.sql, params = ?q.params, "query");
        match q.operation {
            Operation::Select => Self::query_many(&mut conn, q).await.map(QueryOutcome::Rows),
            Operation::Insert => {
                let done = Self::bind_all(q).execute(&mut *conn).await?;
                Ok(QueryOutcome::Inserted {
                    id: done.last_insert_rowid(),
                })
            }
            Operation::Update | Operation::Delete => {
                let done = Self::bind_all(q).execute(&mut *conn).await?;
                Ok(QueryOutcome::Affected {
                    operation: q.operation,
                    rows: done.rows_affected(),
                })
            }
        }
    }

    /// A miss against the cached catalog reloads it once, so tables created after the pool opened are found.
    async fn check_identifiers(
        handle: &TenantHandle,
        conn: &mut SqliteConnection,
        q: &QueryBuf,
    ) -> Result<(), AppError> {
        let catalog = handle.catalog(conn, false).await?;
        if catalog.check(q).is_ok() {
            return Ok(());
        }
        let catalog = handle.catalog(conn, true).await?;
        catalog.check(q).map_err(AppError::from)
    }

    fn bind_all(q: &QueryBuf) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        query
    }

    async fn query_many(
        conn: &mut SqliteConnection,
        q: &QueryBuf,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        let rows = Self::bind_all(q).fetch_all(&mut *conn).await?;
        rows.iter().map(row_to_json).collect()
    }
}

fn row_to_json(row: &SqliteRow) -> Result<Map<String, Value>, AppError> {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i)?);
    }
    Ok(map)
}

/// Decode by the value's storage class; BLOBs come back as (lossy) UTF-8 text.
fn cell_to_value(row: &SqliteRow, i: usize) -> Result<Value, AppError> {
    use sqlx::{Row, TypeInfo, ValueRef};
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let class = raw.type_info().name().to_ascii_uppercase();
    Ok(match class.as_str() {
        "INTEGER" | "BOOLEAN" | "INT8" => Value::Number(row.try_get::<i64, _>(i)?.into()),
        "REAL" => serde_json::Number::from_f64(row.try_get::<f64, _>(i)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => {
            let bytes = row.try_get::<Vec<u8>, _>(i)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::String(row.try_get::<String, _>(i)?),
    })
}
