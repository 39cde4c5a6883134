//! Primitive values bound to query placeholders.

use serde::{Deserialize, Serialize};

/// A primitive value bound to a positional placeholder.
///
/// `Unset` is a distinct absence marker from `Null`: callers use it for
/// fields that were never provided at all. The distinction only matters at
/// the backend boundary, where executors normalize `Unset` to NULL before
/// binding (SQLite has no native unset/null distinction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Unset,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Whether this value binds as NULL (either variant of absence).
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Null | Value::Unset)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
