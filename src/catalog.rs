//! Per-tenant schema catalog used to allow-list identifiers before they are interpolated.

use crate::error::CompileError;
use crate::sql::QueryBuf;
use sqlx::SqliteConnection;
use std::collections::{HashMap, HashSet};

/// Tables (and views) of one tenant database with their column names.
/// SQLite identifiers are case-insensitive, so names are stored and compared ASCII-lowercased.
#[derive(Clone, Debug, Default)]
pub struct SchemaCatalog {
    tables: HashMap<String, HashSet<String>>,
}

impl SchemaCatalog {
    pub fn from_tables<I, C>(tables: I) -> Self
    where
        I: IntoIterator<Item = (String, C)>,
        C: IntoIterator<Item = String>,
    {
        SchemaCatalog {
            tables: tables
                .into_iter()
                .map(|(t, cols)| (fold(&t), cols.into_iter().map(|c| fold(&c)).collect()))
                .collect(),
        }
    }

    /// Read the catalog through `sqlite_master` and `pragma_table_info`. Table names are bound, not interpolated.
    pub async fn load(conn: &mut SqliteConnection) -> Result<Self, sqlx::Error> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&mut *conn)
        .await?;
        let mut tables = HashMap::with_capacity(names.len());
        for name in names {
            let cols = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?1)")
                .bind(name.clone())
                .fetch_all(&mut *conn)
                .await?;
            tables.insert(fold(&name), cols.iter().map(|c| fold(c)).collect());
        }
        tracing::debug!(tables = tables.len(), "schema catalog loaded");
        Ok(SchemaCatalog { tables })
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(&fold(table))
    }

    /// Every table and column the statement interpolates must exist.
    pub fn check(&self, q: &QueryBuf) -> Result<(), CompileError> {
        for t in &q.tables {
            if !self.has_table(t) {
                return Err(CompileError::UnknownTable(t.clone()));
            }
        }
        for c in &q.columns {
            let known = self
                .tables
                .get(&fold(&c.table))
                .map(|cols| cols.contains(&fold(&c.column)))
                .unwrap_or(false);
            if !known {
                return Err(CompileError::UnknownColumn {
                    table: c.table.clone(),
                    column: c.column.clone(),
                });
            }
        }
        Ok(())
    }
}

fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}
