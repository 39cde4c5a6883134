//! Per-backend query executors.
//!
//! Each executor binds values strictly by position, executes against its
//! pool, and normalizes the response to a uniform [`QueryOutput`] so callers
//! see one shape regardless of engine. Executors never retry; retry policy
//! belongs to callers.

pub mod postgres;
pub mod sqlite;

use std::collections::HashMap;

use serde::Serialize;

use crate::value::Value;

/// One result row, keyed by column name.
pub type Row = HashMap<String, serde_json::Value>;

/// Uniform query result regardless of backend.
///
/// `row_count` is the number of returned rows; mutations without a
/// `RETURNING` clause report 0.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryOutput {
    pub rows: Vec<Row>,
    pub row_count: usize,
}

/// Normalize `Unset` markers to NULL before binding. SQLite has no native
/// unset/null distinction, and both backends are treated uniformly here.
pub(crate) fn normalize_unset(values: &[Value]) -> Vec<Value> {
    values
        .iter()
        .map(|value| match value {
            Value::Unset => Value::Null,
            other => other.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_normalizes_to_null() {
        let values = vec![Value::Text("p1".into()), Value::Unset, Value::Null];
        assert_eq!(
            normalize_unset(&values),
            vec![Value::Text("p1".into()), Value::Null, Value::Null]
        );
    }
}
