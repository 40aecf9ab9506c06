use std::path::Path;
use std::path::PathBuf;

use uuid::Uuid;

use super::KvStore;
use super::check_key;
use crate::error::JournalError;
use crate::error::Result;

/// One pretty-printed JSON file per key under `dir`.
///
/// Writes go to a sibling temp file which is then renamed over the target, so
/// a reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for JsonDirStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        check_key(key)?;
        let path = self.path_for(key);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(JournalError::StorageUnavailable(format!(
                    "read {}: {e}",
                    path.display()
                )));
            }
        };
        tracing::debug!(key, bytes = data.len(), "store read");
        let value = serde_json::from_str(&data).map_err(|e| {
            JournalError::StorageUnavailable(format!("parse {}: {e}", path.display()))
        })?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        check_key(key)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            JournalError::StorageUnavailable(format!("create_dir_all {}: {e}", self.dir.display()))
        })?;
        let body = serde_json::to_string_pretty(&value).map_err(JournalError::storage)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, body.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(JournalError::StorageUnavailable(format!(
                "write {}: {e}",
                tmp.display()
            )));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(JournalError::StorageUnavailable(format!(
                "rename into {}: {e}",
                target.display()
            )));
        }
        tracing::debug!(key, bytes = body.len(), "store write");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("data"));
        assert_eq!(store.get("entries").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_replaces_whole_value_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store.set("nextAvailableTime", json!(5)).await.unwrap();
        store.set("nextAvailableTime", json!(0)).await.unwrap();
        assert_eq!(store.get("nextAvailableTime").await.unwrap(), Some(json!(0)));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["nextAvailableTime.json".to_string()]);
    }

    #[tokio::test]
    async fn corrupt_file_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("entries.json"), "{not json").unwrap();
        let store = JsonDirStore::new(dir.path());
        let err = store.get("entries").await.unwrap_err();
        assert!(matches!(err, JournalError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn path_like_keys_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        assert!(store.set("../escape", json!(1)).await.is_err());
    }
}
