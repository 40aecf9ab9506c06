use std::path::Path;

use crate::error::Result;
use crate::store::KvStore;
use crate::store::json_dir::JsonDirStore;
use crate::store::memory::MemoryStore;

#[cfg(feature = "sqlite")]
use crate::store::sqlite::SqliteStore;

/// Backend selection for the persisted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Json,
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl Backend {
    /// Parse a backend name. Unknown names, and `sqlite` when it is not
    /// compiled in, fall back to JSON.
    pub fn parse(name: &str) -> Backend {
        match name.trim().to_ascii_lowercase().as_str() {
            "memory" => Backend::Memory,
            #[cfg(feature = "sqlite")]
            "sqlite" => Backend::Sqlite,
            "json" | "" => Backend::Json,
            other => {
                tracing::warn!("unknown store backend {other:?}, using json");
                Backend::Json
            }
        }
    }
}

/// Choose backend using env `SNAPDAY_STORE_BACKEND` if present: `json`, `sqlite` or `memory`.
pub fn choose_backend_from_env() -> Option<Backend> {
    std::env::var("SNAPDAY_STORE_BACKEND")
        .ok()
        .map(|v| Backend::parse(&v))
}

/// Store chosen at runtime. `KvStore` is not object safe, so dispatch is by enum.
#[derive(Debug)]
pub enum AnyStore {
    Json(JsonDirStore),
    Memory(MemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteStore),
}

impl KvStore for AnyStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        match self {
            AnyStore::Json(s) => s.get(key).await,
            AnyStore::Memory(s) => s.get(key).await,
            #[cfg(feature = "sqlite")]
            AnyStore::Sqlite(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        match self {
            AnyStore::Json(s) => s.set(key, value).await,
            AnyStore::Memory(s) => s.set(key, value).await,
            #[cfg(feature = "sqlite")]
            AnyStore::Sqlite(s) => s.set(key, value).await,
        }
    }
}

/// Open the store for `data_dir`.
/// - JSON: one file per key directly under `data_dir`
/// - SQLite: `data_dir/snapday.db`
pub fn open_store(data_dir: &Path, backend: Backend) -> Result<AnyStore> {
    Ok(match backend {
        Backend::Json => AnyStore::Json(JsonDirStore::new(data_dir)),
        Backend::Memory => AnyStore::Memory(MemoryStore::new()),
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => {
            std::fs::create_dir_all(data_dir).map_err(crate::error::JournalError::storage)?;
            AnyStore::Sqlite(SqliteStore::new(data_dir.join("snapday.db")))
        }
    })
}
