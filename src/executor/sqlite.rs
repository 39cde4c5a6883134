//! SQLite executor.
//!
//! The alternate backend. Query text arriving here has already been
//! translated to SQLite syntax by the dispatcher. The pool is process-wide
//! state: injected once by the host (or a test) before first use, or
//! lazily connected from `SQLITE_DATABASE_URL`, and never replaced.

use std::env;
use std::sync::OnceLock;

use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, SqlitePool, TypeInfo};
use tokio::sync::OnceCell;

use crate::error::{BridgeError, BridgeResult};
use crate::executor::{QueryOutput, Row, normalize_unset};
use crate::value::Value;

static INJECTED_POOL: OnceLock<SqlitePool> = OnceLock::new();

/// Inject the process-wide SQLite pool, used by tests or by hosting
/// environments that supply the handle out-of-band. Must be called before
/// first real use; the first successful set wins and later calls are
/// ignored.
pub fn set_sqlite_pool(pool: SqlitePool) {
    if INJECTED_POOL.set(pool).is_err() {
        tracing::warn!("SQLite pool already set, ignoring duplicate injection");
    }
}

/// The injected pool, if any. Also serves as the dispatcher's ambient
/// backend-detection signal.
pub(crate) fn injected_pool() -> Option<&'static SqlitePool> {
    INJECTED_POOL.get()
}

/// Executes queries against the process-wide SQLite pool.
pub struct SqliteExecutor {
    pool: OnceCell<SqlitePool>,
}

impl SqliteExecutor {
    /// An executor that uses the injected pool, or connects from
    /// `SQLITE_DATABASE_URL` on first use.
    pub fn new() -> Self {
        Self {
            pool: OnceCell::new(),
        }
    }

    /// An executor around an existing pool.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    async fn pool(&self) -> BridgeResult<&SqlitePool> {
        self.pool
            .get_or_try_init(|| async {
                if let Some(pool) = injected_pool() {
                    return Ok(pool.clone());
                }
                match env::var("SQLITE_DATABASE_URL") {
                    Ok(url) => SqlitePoolOptions::new()
                        .max_connections(5)
                        .connect(&url)
                        .await
                        .map_err(|e| {
                            BridgeError::Config(format!("failed to connect to SQLite: {e}"))
                        }),
                    Err(_) => Err(BridgeError::Config(
                        "SQLite pool not initialized. Call set_sqlite_pool() \
                         before first use or set SQLITE_DATABASE_URL."
                            .into(),
                    )),
                }
            })
            .await
    }

    /// Bind values by position, execute, and normalize the rows.
    pub async fn query(&self, text: &str, values: &[Value]) -> BridgeResult<QueryOutput> {
        let pool = self.pool().await?;
        let bound = normalize_unset(values);

        let mut query = sqlx::query(text);
        for value in &bound {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(pool).await.map_err(|error| {
            tracing::error!(query = %text, values = ?values, %error, "sqlite query failed");
            BridgeError::database(text, values, error)
        })?;

        let rows: Vec<Row> = rows.iter().map(row_to_map).collect();
        Ok(QueryOutput {
            row_count: rows.len(),
            rows,
        })
    }
}

impl Default for SqliteExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        Value::Null | Value::Unset => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
    }
}

/// Convert a SqliteRow to a column-keyed map, degrading undecodable values
/// to JSON null. SQLite's type affinity means expression columns report
/// loose types, so the fallback arm probes integer, float, then text.
fn row_to_map(row: &SqliteRow) -> Row {
    let mut map = Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();

        let value: serde_json::Value = match column.type_info().name() {
            "BOOLEAN" => row
                .try_get::<bool, _>(i)
                .map(serde_json::Value::Bool)
                .or_else(|_| {
                    row.try_get::<i64, _>(i)
                        .map(|v| serde_json::Value::Number(v.into()))
                })
                .unwrap_or(serde_json::Value::Null),
            "INTEGER" | "INT" | "BIGINT" => row
                .try_get::<i64, _>(i)
                .map(|v| serde_json::Value::Number(v.into()))
                .unwrap_or(serde_json::Value::Null),
            "REAL" => row
                .try_get::<f64, _>(i)
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            "TEXT" | "DATETIME" | "DATE" => row
                .try_get::<String, _>(i)
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
            // expression columns have no declared type; probe the value
            _ => row
                .try_get::<i64, _>(i)
                .map(|v| serde_json::Value::Number(v.into()))
                .ok()
                .or_else(|| {
                    row.try_get::<f64, _>(i)
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(serde_json::Value::Number)
                })
                .or_else(|| {
                    row.try_get::<String, _>(i)
                        .ok()
                        .map(serde_json::Value::String)
                })
                .unwrap_or(serde_json::Value::Null),
        };

        map.insert(name, value);
    }

    map
}
