//! Shared test fixtures: a seeded throwaway SQLite database.

use sqlx::{Connection, SqliteConnection};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_DB: AtomicU32 = AtomicU32::new(0);

/// Create a fresh SQLite database file with the canonical `foo` table
/// and return its connection string. One file per call, so tests never
/// share state.
pub async fn seeded_database() -> String {
    let path = std::env::temp_dir().join(format!(
        "sqlgate-test-{}-{}.db",
        std::process::id(),
        NEXT_DB.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_file(&path);
    let dsn = format!("sqlite://{}?mode=rwc", path.display());

    let mut conn = SqliteConnection::connect(&dsn).await.unwrap();
    sqlx::query("create table foo (id integer not null primary key, bar text, foot real)")
        .execute(&mut conn)
        .await
        .unwrap();
    sqlx::query("insert into foo (id, bar, foot) values (1, 'hello', 1.2), (2, 'asdf', 2.0)")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();

    dsn
}
