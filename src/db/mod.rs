pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

pub type DbConn = Arc<Mutex<Connection>>;

/// Directory holding the database.
/// Uses ANIFLIX_DATA_DIR, then the platform data dir, then ./data/
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ANIFLIX_DATA_DIR") {
        PathBuf::from(dir)
    } else if let Some(dir) = dirs::data_dir() {
        dir.join("aniflix")
    } else {
        PathBuf::from("data")
    }
}

pub fn db_path() -> PathBuf {
    data_dir().join("aniflix.db")
}

/// Open (or create) the database and run initialization.
pub fn open_database(path: &Path) -> Result<DbConn, rusqlite::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    initialize_database(&conn)?;

    info!("Database opened at {}", path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database with the same schema. Used when the data dir is unusable, and by tests.
pub fn open_in_memory() -> Result<DbConn, rusqlite::Error> {
    let conn = Connection::open_in_memory()?;
    initialize_database(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Lock the connection. A poisoned lock still holds a usable connection.
pub(crate) fn lock(conn: &DbConn) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn initialize_database(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key             TEXT PRIMARY KEY,
            value           TEXT NOT NULL,
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS search_counts (
            search_term     TEXT PRIMARY KEY,
            count           INTEGER NOT NULL DEFAULT 0,
            movie_id        INTEGER NOT NULL,
            poster_url      TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_search_counts_count ON search_counts(count DESC);

        CREATE TABLE IF NOT EXISTS settings (
            key             TEXT PRIMARY KEY,
            value           TEXT NOT NULL
        );",
    )?;

    let defaults = [
        ("tmdb_token", ""),
        ("appwrite_endpoint", "https://cloud.appwrite.io/v1"),
        ("appwrite_project", ""),
        ("appwrite_database", ""),
        ("appwrite_collection", ""),
        ("appwrite_key", ""),
    ];

    let mut stmt = conn.prepare("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")?;
    for (key, value) in &defaults {
        stmt.execute(rusqlite::params![key, value])?;
    }

    info!("Database initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_database_creates_parent_dir_and_seeds_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("aniflix.db");

        let conn = open_database(&path).unwrap();
        assert!(path.exists());

        let settings = queries::fetch_settings(&conn).unwrap();
        assert!(settings.iter().any(|s| s.key == "tmdb_token"));
        assert!(settings.iter().any(|s| s.key == "appwrite_collection"));
    }

    #[test]
    fn reopening_keeps_existing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aniflix.db");

        {
            let conn = open_database(&path).unwrap();
            queries::set_setting(&conn, "tmdb_token", "abc").unwrap();
        }

        let conn = open_database(&path).unwrap();
        let settings = queries::fetch_settings(&conn).unwrap();
        let token = settings.iter().find(|s| s.key == "tmdb_token").unwrap();
        assert_eq!(token.value, "abc");
    }
}
