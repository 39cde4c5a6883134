//! # sqlbridge — dialect-translating query adapter
//!
//! > Write PostgreSQL once. Run it on PostgreSQL or SQLite.
//!
//! Application code issues parameterized queries in the PostgreSQL dialect;
//! the adapter executes them against whichever backend the process resolved
//! at startup, rewriting the text for SQLite when needed while keeping
//! every positional placeholder aligned with its bound value.
//!
//! ## Quick example
//!
//! ```rust,ignore
//! use sqlbridge::{BridgeDb, sql};
//!
//! let db = BridgeDb::sqlite(pool);
//!
//! let tag = "sunset";
//! let result = db
//!     .sql(sql!("SELECT * FROM photos WHERE ", tag, " = ANY(tags)")?)
//!     .await?;
//! // on SQLite the text ran as:
//! // SELECT * FROM photos WHERE EXISTS
//! //   (SELECT 1 FROM json_each(tags) WHERE json_each.value = ?)
//! ```
//!
//! Values always travel out-of-band: the `sql!` macro turns each
//! interpolation point into a `$n` placeholder and the executors bind the
//! values by position, so nothing is ever spliced into query text.

pub mod backend;
pub mod error;
pub mod executor;
pub mod template;
pub mod translate;
pub mod value;

pub use backend::{Backend, BackendConfig, BridgeDb, db};
pub use error::{BridgeError, BridgeResult};
pub use executor::sqlite::set_sqlite_pool;
pub use executor::{QueryOutput, Row};
pub use template::Query;
pub use value::Value;

pub mod prelude {
    pub use crate::backend::{Backend, BackendConfig, BridgeDb};
    pub use crate::error::{BridgeError, BridgeResult};
    pub use crate::executor::{QueryOutput, Row};
    pub use crate::template::Query;
    pub use crate::value::Value;
}

/// Execute PostgreSQL-dialect query text with positional values against the
/// process-wide handle.
pub async fn query(text: &str, values: &[Value]) -> BridgeResult<QueryOutput> {
    backend::db().query(text, values).await
}

/// Execute a query built by the [`sql!`] macro against the process-wide
/// handle.
pub async fn sql(query: Query) -> BridgeResult<QueryOutput> {
    backend::db().sql(query).await
}

/// Probe connectivity of the process-wide handle.
pub async fn test_connection() -> bool {
    backend::db().test_connection().await
}
