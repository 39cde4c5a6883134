//! PostgreSQL executor.
//!
//! Queries are already in the source dialect, so text is executed as-is;
//! only value binding and row normalization happen here.

use std::env;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row as _, TypeInfo};
use tokio::sync::OnceCell;

use crate::error::{BridgeError, BridgeResult};
use crate::executor::{QueryOutput, Row, normalize_unset};
use crate::value::Value;

/// Executes queries against a lazily-connected PostgreSQL pool.
pub struct PostgresExecutor {
    pool: OnceCell<PgPool>,
}

impl PostgresExecutor {
    /// An executor that connects from `POSTGRES_URL`/`DATABASE_URL` on
    /// first use.
    pub fn new() -> Self {
        Self {
            pool: OnceCell::new(),
        }
    }

    /// An executor around an existing pool.
    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    async fn pool(&self) -> BridgeResult<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                let url = env::var("POSTGRES_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .map_err(|_| {
                        BridgeError::Config(
                            "PostgreSQL connection URL not set \
                             (POSTGRES_URL or DATABASE_URL)"
                                .into(),
                        )
                    })?;
                PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&url)
                    .await
                    .map_err(|e| {
                        BridgeError::Config(format!("failed to connect to PostgreSQL: {e}"))
                    })
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
            tracing::error!(query = %text, values = ?values, %error, "postgres query failed");
            BridgeError::database(text, values, error)
        })?;

        let rows: Vec<Row> = rows.iter().map(row_to_map).collect();
        Ok(QueryOutput {
            row_count: rows.len(),
            rows,
        })
    }
}

impl Default for PostgresExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    value: &Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match value {
        Value::Null | Value::Unset => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
    }
}

/// Convert a PgRow to a column-keyed map, degrading undecodable values to
/// JSON null.
fn row_to_map(row: &PgRow) -> Row {
    let mut map = Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();

        let value: serde_json::Value = match column.type_info().name() {
            "BOOL" => row
                .try_get::<bool, _>(i)
                .map(serde_json::Value::Bool)
                .unwrap_or(serde_json::Value::Null),
            "INT2" => row
                .try_get::<i16, _>(i)
                .map(|v| serde_json::Value::Number(i64::from(v).into()))
                .unwrap_or(serde_json::Value::Null),
            "INT4" => row
                .try_get::<i32, _>(i)
                .map(|v| serde_json::Value::Number(i64::from(v).into()))
                .unwrap_or(serde_json::Value::Null),
            "INT8" => row
                .try_get::<i64, _>(i)
                .map(|v| serde_json::Value::Number(v.into()))
                .unwrap_or(serde_json::Value::Null),
            "FLOAT4" => row
                .try_get::<f32, _>(i)
                .ok()
                .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            "FLOAT8" => row
                .try_get::<f64, _>(i)
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            "TIMESTAMPTZ" => row
                .try_get::<chrono::DateTime<chrono::Utc>, _>(i)
                .map(|v| serde_json::Value::String(v.to_rfc3339()))
                .unwrap_or(serde_json::Value::Null),
            "TIMESTAMP" => row
                .try_get::<chrono::NaiveDateTime, _>(i)
                .map(|v| serde_json::Value::String(v.to_string()))
                .unwrap_or(serde_json::Value::Null),
            "DATE" => row
                .try_get::<chrono::NaiveDate, _>(i)
                .map(|v| serde_json::Value::String(v.to_string()))
                .unwrap_or(serde_json::Value::Null),
            "JSON" | "JSONB" => row
                .try_get::<serde_json::Value, _>(i)
                .unwrap_or(serde_json::Value::Null),
            "TEXT[]" | "VARCHAR[]" => row
                .try_get::<Vec<String>, _>(i)
                .map(|v| {
                    serde_json::Value::Array(
                        v.into_iter().map(serde_json::Value::String).collect(),
                    )
                })
                .unwrap_or(serde_json::Value::Null),
            _ => row
                .try_get::<String, _>(i)
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
        };

        map.insert(name, value);
    }

    map
}
