use std::sync::Arc;

use crate::error::JournalError;
use crate::error::Result;
use crate::store::ENTRIES_KEY;
use crate::store::KvStore;
use crate::store::read_or;
use crate::store::write;
use crate::types::Entry;

/// Ordered collection of entries under the `entries` key.
///
/// Nothing is cached between calls: every operation reads the store first,
/// so it always sees the latest persisted collection. Only the foreground
/// context writes this key.
pub struct EntryRepository<S> {
    store: Arc<S>,
}

impl<S> Clone for EntryRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore> EntryRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append without any uniqueness check; gating is the caller's job.
    pub async fn append(&self, entry: Entry) -> Result<()> {
        let mut entries = self.list().await?;
        entries.push(entry);
        write(self.store.as_ref(), ENTRIES_KEY, &entries).await?;
        tracing::debug!(len = entries.len(), "entry appended");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Entry>> {
        read_or(self.store.as_ref(), ENTRIES_KEY, Vec::new()).await
    }

    /// Remove the entry at `index`. Later entries shift down by one, so any
    /// index held by a caller from before this call is stale afterwards.
    pub async fn delete_at(&self, index: usize) -> Result<Entry> {
        let mut entries = self.list().await?;
        if index >= entries.len() {
            return Err(JournalError::OutOfRange {
                index,
                len: entries.len(),
            });
        }
        let removed = entries.remove(index);
        write(self.store.as_ref(), ENTRIES_KEY, &entries).await?;
        tracing::debug!(index, len = entries.len(), "entry deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::types::ImageRef;
    use pretty_assertions::assert_eq;

    fn entry(message: &str, day: u32) -> Entry {
        let date = format!("2024-06-{day:02}T09:00:00Z").parse().unwrap();
        Entry::new(message, ImageRef::from_bytes("image/png", message.as_bytes()), date)
    }

    fn messages(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.message.as_str()).collect()
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let repo = EntryRepository::new(Arc::new(MemoryStore::new()));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_preserves_append_order() {
        let repo = EntryRepository::new(Arc::new(MemoryStore::new()));
        for (i, m) in ["a", "b", "c", "d"].iter().enumerate() {
            repo.append(entry(m, i as u32 + 1)).await.unwrap();
        }
        assert_eq!(messages(&repo.list().await.unwrap()), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn delete_shifts_later_indices_down() {
        let repo = EntryRepository::new(Arc::new(MemoryStore::new()));
        for (i, m) in ["a", "b", "c"].iter().enumerate() {
            repo.append(entry(m, i as u32 + 1)).await.unwrap();
        }
        let removed = repo.delete_at(1).await.unwrap();
        assert_eq!(removed.message, "b");
        let left = repo.list().await.unwrap();
        assert_eq!(messages(&left), vec!["a", "c"]);
        // what used to be index 2 is now index 1
        assert_eq!(repo.delete_at(1).await.unwrap().message, "c");
    }

    #[tokio::test]
    async fn delete_out_of_range_leaves_collection_unchanged() {
        let repo = EntryRepository::new(Arc::new(MemoryStore::new()));
        for (i, m) in ["a", "b", "c"].iter().enumerate() {
            repo.append(entry(m, i as u32 + 1)).await.unwrap();
        }
        let err = repo.delete_at(5).await.unwrap_err();
        assert!(matches!(err, JournalError::OutOfRange { index: 5, len: 3 }));
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn sees_writes_made_through_another_handle() {
        let store = Arc::new(MemoryStore::new());
        let popup = EntryRepository::new(Arc::clone(&store));
        let other = EntryRepository::new(store);
        popup.append(entry("a", 1)).await.unwrap();
        other.append(entry("b", 2)).await.unwrap();
        assert_eq!(messages(&popup.list().await.unwrap()), vec!["a", "b"]);
    }
}
