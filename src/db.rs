//! Per-call database query execution.
//!
//! Every call opens its own connection and closes it before returning, so a
//! failing query can never leak a connection. The caller's SQL runs inside a
//! transaction that is always rolled back.

use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Connection, PgConnection, Row};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("result encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Execute caller-supplied SQL verbatim and return the row set as a JSON
/// array of objects keyed by column name.
///
/// No statement-type restriction is enforced; "read-only" is a convention.
/// The enclosing transaction is rolled back unconditionally, so committed
/// writes cannot happen through this path, but side effects outside
/// transactional control (e.g. sequence advancement) still can.
pub async fn run_query(database_url: &str, sql: &str) -> Result<String, DbError> {
    let mut conn = PgConnection::connect(database_url).await?;
    tracing::debug!("executing SQL: {}", sql);

    let result = fetch_rolled_back(&mut conn, sql).await;
    conn.close().await.ok();

    let rows = result?;
    let values: Vec<Value> = rows.iter().map(row_to_json).collect();
    Ok(serde_json::to_string(&values)?)
}

async fn fetch_rolled_back(conn: &mut PgConnection, sql: &str) -> Result<Vec<PgRow>, sqlx::Error> {
    let mut tx = conn.begin().await?;
    let result = sqlx::query(sql).fetch_all(&mut *tx).await;
    tx.rollback().await.ok();
    result
}

/// Convert a row to JSON with best-effort typed extraction per column.
fn row_to_json(row: &PgRow) -> Value {
    let mut obj = serde_json::Map::new();

    for col in row.columns() {
        let name = col.name();

        let value: Value = if let Ok(v) = row.try_get::<i64, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<i32, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<f64, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<bool, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<String, _>(name) {
            json!(v)
        } else if let Ok(v) = row.try_get::<Value, _>(name) {
            v
        } else if let Ok(v) = row.try_get::<Option<String>, _>(name) {
            match v {
                Some(s) => json!(s),
                None => Value::Null,
            }
        } else {
            Value::Null
        };

        obj.insert(name.to_string(), value);
    }

    Value::Object(obj)
}
