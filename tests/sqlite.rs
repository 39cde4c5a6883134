//! End-to-end tests for the SQLite path.
//!
//! Every query below is written in the PostgreSQL dialect and goes through
//! the dispatcher, so these exercise translation, positional binding, and
//! row normalization together against an in-memory database.

use sqlbridge::{Backend, BackendConfig, BridgeDb, Value, sql};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn memory_pool() -> SqlitePool {
    // a single connection so every statement sees the same in-memory db
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

/// Build a database with the photo fixtures used across these tests.
async fn fixture_db() -> BridgeDb {
    let db = BridgeDb::sqlite(memory_pool().await);

    db.query(
        "CREATE TABLE photos (
            id TEXT PRIMARY KEY,
            title TEXT,
            city TEXT,
            country TEXT,
            tags TEXT,
            created_at TEXT,
            hidden BOOLEAN DEFAULT FALSE,
            priority BOOLEAN
        )",
        &[],
    )
    .await
    .unwrap();

    for (id, title, city, country, tags, created_at, priority) in [
        (
            "p1",
            "Golden Hour",
            "Paris",
            "France",
            r#"["sunset","golden"]"#,
            "2023-05-01T00:00:00",
            Value::Bool(true),
        ),
        (
            "p2",
            "Surf",
            "Lisbon",
            "Portugal",
            r#"["beach"]"#,
            "2024-11-20T14:30:00",
            Value::Null,
        ),
    ] {
        db.query(
            "INSERT INTO photos (id, title, city, country, tags, created_at, priority) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[
                id.into(),
                title.into(),
                city.into(),
                country.into(),
                tags.into(),
                created_at.into(),
                priority,
            ],
        )
        .await
        .unwrap();
    }

    db
}

#[tokio::test]
async fn test_any_membership_finds_tagged_rows() {
    let db = fixture_db().await;

    let result = db
        .query(
            "SELECT * FROM photos WHERE $1 = ANY(tags)",
            &["sunset".into()],
        )
        .await
        .unwrap();

    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0]["id"], serde_json::json!("p1"));
}

#[tokio::test]
async fn test_any_membership_does_not_shift_later_bindings() {
    let db = fixture_db().await;

    // the second value must still bind to the id comparison after the
    // membership test is rewritten into a subquery
    let result = db
        .query(
            "SELECT * FROM photos WHERE $1 = ANY(tags) AND id != $2",
            &["sunset".into(), "p2".into()],
        )
        .await
        .unwrap();
    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0]["id"], serde_json::json!("p1"));

    let excluded = db
        .query(
            "SELECT * FROM photos WHERE $1 = ANY(tags) AND id != $2",
            &["sunset".into(), "p1".into()],
        )
        .await
        .unwrap();
    assert_eq!(excluded.row_count, 0);
}

#[tokio::test]
async fn test_extract_year_from_fixture_timestamp() {
    let db = fixture_db().await;

    let result = db
        .query(
            "SELECT EXTRACT(YEAR FROM created_at) AS y FROM photos WHERE id = $1",
            &["p1".into()],
        )
        .await
        .unwrap();

    assert_eq!(result.rows[0]["y"], serde_json::json!(2023));
}

#[tokio::test]
async fn test_boolean_update_round_trip() {
    let db = fixture_db().await;

    let updated = db
        .query(
            "UPDATE photos SET hidden = $1 WHERE id = $2",
            &[true.into(), "p1".into()],
        )
        .await
        .unwrap();
    assert_eq!(updated.row_count, 0);

    let stored = db
        .query("SELECT hidden FROM photos WHERE id = $1", &["p1".into()])
        .await
        .unwrap();
    assert_eq!(stored.rows[0]["hidden"], serde_json::json!(1));

    let visible = db
        .query("SELECT id FROM photos WHERE hidden IS TRUE", &[])
        .await
        .unwrap();
    assert_eq!(visible.row_count, 1);
    assert_eq!(visible.rows[0]["id"], serde_json::json!("p1"));
}

#[tokio::test]
async fn test_is_not_true_matches_null_rows() {
    let db = fixture_db().await;

    // p1 has priority = true, p2 has priority NULL; three-valued logic
    // keeps the NULL row in the IS NOT TRUE result
    let result = db
        .query("SELECT id FROM photos WHERE priority IS NOT TRUE", &[])
        .await
        .unwrap();

    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0]["id"], serde_json::json!("p2"));
}

#[tokio::test]
async fn test_concat_joins_identically() {
    let db = fixture_db().await;

    let result = db
        .query(
            "SELECT CONCAT(city, ', ', country) AS loc FROM photos WHERE id = $1",
            &["p1".into()],
        )
        .await
        .unwrap();

    assert_eq!(result.rows[0]["loc"], serde_json::json!("Paris, France"));
}

#[tokio::test]
async fn test_boolean_ddl_default_applies() {
    let db = fixture_db().await;

    // hidden was declared BOOLEAN DEFAULT FALSE and never set for p2
    let result = db
        .query("SELECT hidden FROM photos WHERE id = $1", &["p2".into()])
        .await
        .unwrap();

    assert_eq!(result.rows[0]["hidden"], serde_json::json!(0));
}

#[tokio::test]
async fn test_unset_binds_as_null() {
    let db = fixture_db().await;

    db.query(
        "UPDATE photos SET title = $1 WHERE id = $2",
        &[Value::Unset, "p1".into()],
    )
    .await
    .unwrap();

    let result = db
        .query("SELECT title FROM photos WHERE id = $1", &["p1".into()])
        .await
        .unwrap();
    assert_eq!(result.rows[0]["title"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_template_macro_end_to_end() {
    let db = fixture_db().await;

    let id = "p1";
    let result = db
        .sql(sql!("SELECT title FROM photos WHERE id = ", id, "").unwrap())
        .await
        .unwrap();

    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0]["title"], serde_json::json!("Golden Hour"));
}

#[tokio::test]
async fn test_connection_probe() {
    let db = BridgeDb::sqlite(memory_pool().await);
    assert!(db.test_connection().await);
}

#[tokio::test]
async fn test_injected_pool_drives_ambient_detection() {
    sqlbridge::set_sqlite_pool(memory_pool().await);

    // with no flags set, the injected handle is what selects SQLite
    let config = BackendConfig::default();
    assert_eq!(config.resolve(), Backend::Sqlite);

    let db = BridgeDb::resolve(&config);
    assert_eq!(db.backend(), Backend::Sqlite);
    assert!(db.test_connection().await);
}
