//! Database schema snapshot.
//!
//! One introspection query recovers every public-schema column together with
//! its nullability, default, and constraint classification. The snapshot is
//! recomputed on every read and reflects live database state.

use serde::ser::Serializer;
use serde::Serialize;
use sqlx::{Connection, PgConnection};
use std::collections::BTreeMap;
use std::fmt;

/// Constraint classification of a single column.
///
/// The introspection join attaches at most one label per column; a column
/// carrying several constraint types keeps only the first one returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnConstraint {
    PrimaryKey,
    Unique,
    ForeignKey { table: String, column: String },
}

impl fmt::Display for ColumnConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnConstraint::PrimaryKey => write!(f, "PRIMARY KEY"),
            ColumnConstraint::Unique => write!(f, "UNIQUE"),
            ColumnConstraint::ForeignKey { table, column } => {
                write!(f, "FOREIGN KEY → {}({})", table, column)
            }
        }
    }
}

impl Serialize for ColumnConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One column of a table, in ordinal position order.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub constraint: Option<ColumnConstraint>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
}

/// Mapping from table name to its columns, ordered by table name.
pub type SchemaSnapshot = BTreeMap<String, TableSchema>;

/// One row of the introspection query, before grouping.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SchemaRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: String,
    pub column_default: Option<String>,
    pub constraint_type: Option<String>,
    pub foreign_table: Option<String>,
    pub foreign_column: Option<String>,
}

const SCHEMA_QUERY: &str = r#"
SELECT
    c.table_name::text AS table_name,
    c.column_name::text AS column_name,
    c.data_type::text AS data_type,
    c.is_nullable::text AS is_nullable,
    c.column_default::text AS column_default,
    tc.constraint_type::text AS constraint_type,
    ccu.table_name::text AS foreign_table,
    ccu.column_name::text AS foreign_column
FROM
    information_schema.columns c
LEFT JOIN
    information_schema.key_column_usage kcu
    ON c.table_name = kcu.table_name AND c.column_name = kcu.column_name
LEFT JOIN
    information_schema.table_constraints tc
    ON kcu.constraint_name = tc.constraint_name
LEFT JOIN
    information_schema.constraint_column_usage ccu
    ON tc.constraint_name = ccu.constraint_name AND tc.constraint_type = 'FOREIGN KEY'
WHERE
    c.table_schema = 'public'
ORDER BY
    c.table_name, c.ordinal_position
"#;

/// Introspect the public schema of the database at `database_url`.
///
/// Opens a dedicated connection and closes it whether or not the query
/// succeeds. Any database error propagates; no partial snapshot is returned.
pub async fn introspect(database_url: &str) -> Result<SchemaSnapshot, sqlx::Error> {
    let mut conn = PgConnection::connect(database_url).await?;
    let result = sqlx::query_as::<_, SchemaRow>(SCHEMA_QUERY)
        .fetch_all(&mut conn)
        .await;
    conn.close().await.ok();
    Ok(group_rows(result?))
}

/// Group introspection rows into a snapshot, preserving per-table column
/// order as returned by the query (ordinal position).
pub fn group_rows(rows: Vec<SchemaRow>) -> SchemaSnapshot {
    let mut schema = SchemaSnapshot::new();

    for row in rows {
        let constraint = match row.constraint_type.as_deref() {
            Some("PRIMARY KEY") => Some(ColumnConstraint::PrimaryKey),
            Some("UNIQUE") => Some(ColumnConstraint::Unique),
            Some("FOREIGN KEY") => match (row.foreign_table, row.foreign_column) {
                (Some(table), Some(column)) => {
                    Some(ColumnConstraint::ForeignKey { table, column })
                }
                _ => None,
            },
            _ => None,
        };

        let table = schema.entry(row.table_name).or_default();

        // The join emits one row per constraint; a column already present
        // keeps its first label rather than growing a duplicate entry.
        if let Some(existing) = table
            .columns
            .iter_mut()
            .find(|c| c.name == row.column_name)
        {
            if existing.constraint.is_none() {
                existing.constraint = constraint;
            }
            continue;
        }

        table.columns.push(ColumnInfo {
            name: row.column_name,
            data_type: row.data_type,
            nullable: row.is_nullable.eq_ignore_ascii_case("yes"),
            default: row.column_default,
            constraint,
        });
    }

    schema
}
