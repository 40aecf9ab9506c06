use std::path::Path;
use std::path::PathBuf;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use super::KvStore;
use super::check_key;
use crate::error::JournalError;
use crate::error::Result;

fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
}

fn open_conn(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(JournalError::storage)?;
    init_db(&conn).map_err(JournalError::storage)?;
    Ok(conn)
}

/// Single-table SQLite store. Every `set` is one upsert, so each key is
/// replaced atomically.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        check_key(key)?;
        let path = self.path.clone();
        let key = key.to_string();
        let raw = tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            let conn = open_conn(&path)?;
            conn.query_row(
                "SELECT value_json FROM kv WHERE key=?1",
                params![key],
                |r| r.get::<_, String>(0),
            )
            .optional()
            .map_err(JournalError::storage)
        })
        .await
        .map_err(JournalError::storage)??;
        raw.map(|s| serde_json::from_str(&s).map_err(JournalError::storage))
            .transpose()
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        check_key(key)?;
        let path = self.path.clone();
        let key = key.to_string();
        let body = serde_json::to_string(&value).map_err(JournalError::storage)?;
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = open_conn(&path)?;
            conn.execute(
                "INSERT INTO kv (key, value_json, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                        value_json=excluded.value_json,
                        updated_at=excluded.updated_at",
                params![key, body, chrono::Utc::now().to_rfc3339()],
            )
            .map_err(JournalError::storage)?;
            Ok(())
        })
        .await
        .map_err(JournalError::storage)?
    }
}
