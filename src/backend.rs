//! Backend selection and dispatch.
//!
//! Resolves which engine services all queries, then exposes a uniform
//! execution interface so call sites never branch on the active backend.
//! Selection happens once, at composition time or lazily for the
//! process-wide default; there is no dynamic re-selection at runtime.

use std::env;
use std::sync::OnceLock;

use crate::error::BridgeResult;
use crate::executor::postgres::PostgresExecutor;
use crate::executor::sqlite::{SqliteExecutor, injected_pool};
use crate::executor::QueryOutput;
use crate::template::Query;
use crate::translate;
use crate::value::Value;

/// The engine servicing all queries for one [`BridgeDb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

/// Fixed configuration flags read once at process start.
///
/// Resolution precedence: the explicit `USE_SQLITE` override, then the
/// `CLOUDFLARE` deployment-platform flag, then ambient detection of an
/// injected SQLite pool. Absence of all three selects PostgreSQL.
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    /// Explicit "use the alternate backend" override (`USE_SQLITE=true`).
    pub use_sqlite: bool,
    /// Alternate deployment platform flag (`CLOUDFLARE=true`).
    pub cloudflare: bool,
}

impl BackendConfig {
    /// Read the selection flags from the environment.
    pub fn from_env() -> Self {
        Self {
            use_sqlite: flag("USE_SQLITE"),
            cloudflare: flag("CLOUDFLARE"),
        }
    }

    /// Resolve the backend, first match wins.
    pub fn resolve(&self) -> Backend {
        if self.use_sqlite || self.cloudflare || injected_pool().is_some() {
            Backend::Sqlite
        } else {
            Backend::Postgres
        }
    }
}

fn flag(name: &str) -> bool {
    env::var(name).map(|v| v == "true").unwrap_or(false)
}

/// A resolved database handle: one backend, selected once, servicing every
/// query issued through it.
pub struct BridgeDb {
    exec: Exec,
}

enum Exec {
    Postgres(PostgresExecutor),
    Sqlite(SqliteExecutor),
}

impl BridgeDb {
    /// Resolve a handle from configuration flags.
    pub fn resolve(config: &BackendConfig) -> Self {
        let backend = config.resolve();
        let name = match backend {
            Backend::Postgres => "PostgreSQL",
            Backend::Sqlite => "SQLite",
        };
        tracing::info!(backend = name, "database backend selected");
        match backend {
            Backend::Postgres => Self {
                exec: Exec::Postgres(PostgresExecutor::new()),
            },
            Backend::Sqlite => Self {
                exec: Exec::Sqlite(SqliteExecutor::new()),
            },
        }
    }

    /// Compose a handle around an existing PostgreSQL pool.
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            exec: Exec::Postgres(PostgresExecutor::with_pool(pool)),
        }
    }

    /// Compose a handle around an existing SQLite pool.
    pub fn sqlite(pool: sqlx::SqlitePool) -> Self {
        Self {
            exec: Exec::Sqlite(SqliteExecutor::with_pool(pool)),
        }
    }

    /// Which backend this handle resolved to.
    pub fn backend(&self) -> Backend {
        match self.exec {
            Exec::Postgres(_) => Backend::Postgres,
            Exec::Sqlite(_) => Backend::Sqlite,
        }
    }

    /// Execute PostgreSQL-dialect query text with positional values.
    ///
    /// On the SQLite path the text is translated first. This is the
    /// translator's only call site, so a query is never translated twice.
    pub async fn query(&self, text: &str, values: &[Value]) -> BridgeResult<QueryOutput> {
        match &self.exec {
            Exec::Postgres(exec) => exec.query(text, values).await,
            Exec::Sqlite(exec) => {
                let translated = translate::to_sqlite(text);
                exec.query(&translated, values).await
            }
        }
    }

    /// Execute a query built by the [`sql!`](crate::sql) template macro.
    pub async fn sql(&self, query: Query) -> BridgeResult<QueryOutput> {
        self.query(&query.text, &query.values).await
    }

    /// Connectivity probe: runs `SELECT 1` and reports success.
    pub async fn test_connection(&self) -> bool {
        match self.query("SELECT 1 AS test", &[]).await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(%error, "database connection test failed");
                false
            }
        }
    }
}

static DEFAULT_DB: OnceLock<BridgeDb> = OnceLock::new();

/// The process-wide handle, resolved from the environment on first use.
///
/// Convenience entry point only; hosts that want explicit composition build
/// their own [`BridgeDb`]. The first resolution wins and is never replaced.
pub fn db() -> &'static BridgeDb {
    DEFAULT_DB.get_or_init(|| BridgeDb::resolve(&BackendConfig::from_env()))
}
