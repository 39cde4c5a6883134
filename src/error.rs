//! Error types for sqlbridge.

use thiserror::Error;

use crate::value::Value;

/// The main error type for sqlbridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The template builder was invoked with something other than a genuine
    /// fragment/value pair (fragment count must be value count + 1).
    #[error("invalid template invocation: {0}")]
    InvalidTemplate(String),

    /// A backend handle was requested before it was set or derivable from
    /// configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Driver-level execution failure, carrying the query text and bound
    /// values for diagnosis.
    #[error("database error: {source} (query: {query}; values: {values:?})")]
    Database {
        query: String,
        values: Vec<Value>,
        #[source]
        source: sqlx::Error,
    },
}

impl BridgeError {
    /// Wrap a driver failure together with the query it came from.
    pub fn database(query: impl Into<String>, values: &[Value], source: sqlx::Error) -> Self {
        Self::Database {
            query: query.into(),
            values: values.to_vec(),
            source,
        }
    }
}

/// Result type alias for sqlbridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
