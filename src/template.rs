//! Template query builder.
//!
//! Builds a PostgreSQL-dialect query from literal text fragments and
//! interpolated values. Values are never spliced into the text: each
//! interpolation point becomes a `$n` placeholder and the values travel
//! out-of-band, in order, for positional binding by the executor. That
//! separation is the crate's sole injection-prevention mechanism.

use crate::error::{BridgeError, BridgeResult};
use crate::value::Value;

/// A parameterized query: text with `$1..$n` placeholders plus the ordered
/// values they bind to.
///
/// Invariant: the number of placeholders in `text` equals `values.len()`,
/// and the Nth placeholder (left to right) binds the Nth value.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    pub values: Vec<Value>,
}

impl Query {
    /// Wrap already-built query text and its values.
    pub fn new(text: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            text: text.into(),
            values,
        }
    }
}

/// Build a query from N literal fragments and N−1 interpolated values.
///
/// The result is `fragments[0]` followed by `$1`, `fragments[1]`, `$2`, and
/// so on, with the values returned unchanged and in order.
///
/// Fails with [`BridgeError::InvalidTemplate`] when the arguments are not a
/// genuine fragment/value pair — the guard against call sites that bypass
/// the [`sql!`](crate::sql) calling convention and would otherwise be able
/// to splice strings into the query text.
pub fn build(fragments: &[&str], values: Vec<Value>) -> BridgeResult<Query> {
    if fragments.is_empty() {
        return Err(BridgeError::InvalidTemplate(
            "at least one literal fragment is required".into(),
        ));
    }
    if fragments.len() != values.len() + 1 {
        return Err(BridgeError::InvalidTemplate(format!(
            "{} values require {} fragments, got {}",
            values.len(),
            values.len() + 1,
            fragments.len(),
        )));
    }

    let mut text = String::from(fragments[0]);
    for (i, fragment) in fragments[1..].iter().enumerate() {
        text.push('$');
        text.push_str(&(i + 1).to_string());
        text.push_str(fragment);
    }

    Ok(Query { text, values })
}

/// Build a [`Query`] from alternating literal fragments and values.
///
/// The macro enforces the literal-template shape at compile time: fragments
/// must be string literals, values may be any expression convertible into a
/// [`Value`](crate::Value), and the sequence must end with a fragment (use
/// `""` when a query ends at a value).
///
/// ```rust,ignore
/// let id = "p1";
/// let q = sqlbridge::sql!("SELECT * FROM photos WHERE id = ", id, "")?;
/// let result = db.sql(q).await?;
/// ```
#[macro_export]
macro_rules! sql {
    ($first:literal $(, $value:expr, $fragment:literal)* $(,)?) => {
        $crate::template::build(
            &[$first $(, $fragment)*],
            vec![$($crate::Value::from($value)),*],
        )
    };
}
