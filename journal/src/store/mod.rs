use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::JournalError;
use crate::error::Result;

pub mod json_dir;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Key holding the ordered entry collection.
pub const ENTRIES_KEY: &str = "entries";
/// Key holding the next-eligible time in epoch milliseconds, `0` when no gate is active.
pub const NEXT_AVAILABLE_TIME_KEY: &str = "nextAvailableTime";

/// Durable key-value storage shared by every execution context.
///
/// Each `set` replaces the whole value of one key atomically. No ordering is
/// guaranteed across keys or across contexts beyond last-write-wins per key.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<serde_json::Value>>> + Send;
    fn set(&self, key: &str, value: serde_json::Value) -> impl Future<Output = Result<()>> + Send;
}

/// Read `key` as `T`, returning `default` when it was never written.
pub async fn read_or<T, S>(store: &S, key: &str, default: T) -> Result<T>
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value).map_err(|e| {
            JournalError::StorageUnavailable(format!("corrupt value under {key}: {e}"))
        }),
        None => Ok(default),
    }
}

pub async fn write<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + Sync,
    S: KvStore + ?Sized,
{
    let value = serde_json::to_value(value).map_err(JournalError::storage)?;
    store.set(key, value).await
}

pub(crate) fn check_key(key: &str) -> Result<()> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(JournalError::StorageUnavailable(format!(
            "invalid store key: {key:?}"
        )));
    }
    Ok(())
}
