//! PostgreSQL → SQLite dialect translation.
//!
//! Rewrites a PostgreSQL-dialect query string into SQLite syntax via an
//! ordered table of pattern rules rather than a parser: the query surface is
//! generated by a small, closed set of call sites, so a rule table is
//! simpler to audit and extend than a grammar. Unrecognized text passes
//! through unchanged; genuinely malformed input surfaces as a driver error
//! at execution time.
//!
//! The contract every rule must keep: for each placeholder in the rewritten
//! text there is exactly one entry, in left-to-right order, in the bound
//! value sequence. No rule may add a placeholder without a value or shift
//! another placeholder's position.
//!
//! Translation is applied exactly once per query, on the SQLite dispatch
//! path. The rules are not no-ops on their own output, so re-translation is
//! never exercised.

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d+").unwrap());

static ANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\?\s*=\s*ANY\s*\(\s*(\w+)\s*\)").unwrap());

static ILIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bILIKE\b").unwrap());

static EXTRACT_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)EXTRACT\s*\(\s*YEAR\s+FROM\s+(\w+)\s*\)").unwrap());

static NOW_INTERVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*now\(\)\s*-\s*INTERVAL\s*'(\d+)\s+days?'\s*\)").unwrap());

static MAX_INTERVAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(SELECT\s+MAX\((.*?)\)\s*-\s*INTERVAL\s*'(\d+)\s+days?'\s+FROM\s+(.*?)\)")
        .unwrap()
});

static NOW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bNOW\s*\(\s*\)").unwrap());

static IS_NOT_TRUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\w+)\s+IS\s+NOT\s+TRUE").unwrap());

static IS_TRUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\w+)\s+IS\s+TRUE").unwrap());

static IS_NOT_FALSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)IS\s+NOT\s+FALSE").unwrap());

static IS_FALSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)IS\s+FALSE").unwrap());

static BOOLEAN_DEFAULT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)BOOLEAN\s+DEFAULT\s+FALSE").unwrap());

static BOOLEAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bBOOLEAN\b").unwrap());

static CONCAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bCONCAT\s*\(").unwrap());

static REGEXP_REPLACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bREGEXP_REPLACE\s*\(").unwrap());

/// Rewrite PostgreSQL-dialect query text into SQLite syntax.
///
/// Rules are applied in a fixed order; later rules may depend on text
/// introduced by earlier ones (the array-membership rule matches the `?`
/// markers produced by placeholder renumbering).
pub fn to_sqlite(text: &str) -> String {
    // 1. $1, $2, ... -> ?, one-to-one, preserving order
    let t = PLACEHOLDER_RE.replace_all(text, "?").into_owned();

    // 2. `? = ANY(col)` -> existential scan over the column's JSON elements.
    //    The matched placeholder is re-emitted inside the subquery at the
    //    same ordinal position, so the value sequence is untouched.
    let t = ANY_RE
        .replace_all(
            &t,
            "EXISTS (SELECT 1 FROM json_each(${1}) WHERE json_each.value = ?)",
        )
        .into_owned();

    // 3. SQLite LIKE is already case-insensitive for ASCII
    let t = ILIKE_RE.replace_all(&t, "LIKE").into_owned();

    // 4. CONCAT(a, b, ...) -> a || b || ...
    let t = rewrite_concat(&t);

    // 5. EXTRACT(YEAR FROM col) -> strftime cast
    let t = EXTRACT_YEAR_RE
        .replace_all(&t, "CAST(strftime('%Y', ${1}) AS INTEGER)")
        .into_owned();

    // 6. interval arithmetic, plain and correlated-max forms
    let t = NOW_INTERVAL_RE
        .replace_all(&t, "datetime('now', '-${1} days')")
        .into_owned();
    let t = MAX_INTERVAL_RE
        .replace_all(&t, "datetime((SELECT MAX(${1}) FROM ${3}), '-${2} days')")
        .into_owned();

    // 7. two-stage REGEXP_REPLACE normalization collapses to the raw field.
    //    Lossy: downstream values are the field, not the normalized text.
    let t = rewrite_regexp_replace(&t);

    // 8. bare NOW(), after rule 6 has consumed the interval forms
    let t = NOW_RE.replace_all(&t, "datetime('now')").into_owned();

    // 9. integer-encoded booleans; IS NOT TRUE keeps its three-valued
    //    behavior (true over NULL) via the explicit NULL check
    let t = IS_NOT_TRUE_RE
        .replace_all(&t, "(${1} IS NULL OR ${1} != 1)")
        .into_owned();
    let t = IS_TRUE_RE.replace_all(&t, "${1} = 1").into_owned();
    let t = IS_NOT_FALSE_RE.replace_all(&t, "!= 0").into_owned();
    let t = IS_FALSE_RE.replace_all(&t, "= 0").into_owned();

    // 10. boolean column declarations
    let t = BOOLEAN_DEFAULT_RE
        .replace_all(&t, "INTEGER DEFAULT 0")
        .into_owned();
    BOOLEAN_RE.replace_all(&t, "INTEGER").into_owned()
}

/// Rewrite every `CONCAT(...)` call to SQLite's infix `||` operator,
/// preserving operand order and count. Argument splitting is quote-aware so
/// literal separators containing commas (e.g. `', '`) survive intact.
fn rewrite_concat(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(m) = CONCAT_RE.find(rest) {
        let body = &rest[m.end()..];
        match closing_paren(body) {
            Some(end) => {
                out.push_str(&rest[..m.start()]);
                out.push_str(&split_args(&body[..end]).join(" || "));
                rest = &body[end + 1..];
            }
            None => {
                // unbalanced call, pass through
                out.push_str(&rest[..m.end()]);
                rest = body;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapse two-stage `REGEXP_REPLACE(REGEXP_REPLACE(field, ...), ...)`
/// calls to `field` alone. SQLite has no REGEXP_REPLACE; this is a
/// best-effort cleanup, not a semantic port. Single, non-nested calls pass
/// through unchanged.
fn rewrite_regexp_replace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(m) = REGEXP_REPLACE_RE.find(rest) {
        let body = &rest[m.end()..];
        let Some(end) = closing_paren(body) else {
            out.push_str(&rest[..m.end()]);
            rest = body;
            continue;
        };
        let args = &body[..end];

        let inner_field = REGEXP_REPLACE_RE.find(args).and_then(|inner| {
            if !args[..inner.start()].trim().is_empty() {
                return None;
            }
            let inner_body = &args[inner.end()..];
            let inner_end = closing_paren(inner_body)?;
            split_args(&inner_body[..inner_end]).into_iter().next()
        });

        match inner_field {
            Some(field) => {
                out.push_str(&rest[..m.start()]);
                out.push_str(&field);
            }
            None => out.push_str(&rest[..m.end() + end + 1]),
        }
        rest = &body[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Index of the `)` closing an already-consumed `(`, honoring nested parens
/// and single-quoted literals.
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut in_quote = false;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a call's argument list on top-level commas, leaving commas inside
/// quoted literals and nested calls alone.
fn split_args(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                args.push(s[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(s[start..].trim().to_string());
    args
}
