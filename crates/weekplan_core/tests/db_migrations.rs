use rusqlite::Connection;
use tempfile::tempdir;
use weekplan_core::db::migrations::{apply_migrations, latest_version};
use weekplan_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());

    // Columns from the latest migration must be queryable.
    conn.query_row("SELECT COUNT(*) FROM tasks WHERE space = 'work';", [], |row| {
        row.get::<_, i64>(0)
    })
    .unwrap();
}

#[test]
fn apply_migrations_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    apply_migrations(&mut conn).unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn migrations_reject_newer_schema_than_supported() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
        .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert!(matches!(err, DbError::UnsupportedSchemaVersion { .. }));
}

#[test]
fn open_db_creates_and_reopens_file_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weekplan.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO tasks (id, title, duration, kind, status, created_at, sort_order, is_frozen, space)
             VALUES ('00000000-0000-4000-8000-000000000001', 'persisted', 10, 'low', 'unscheduled', 0, 0, 0, 'private');",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
