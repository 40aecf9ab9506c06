use crate::error::Result;
use crate::store::ENTRIES_KEY;
use crate::store::KvStore;
use crate::store::NEXT_AVAILABLE_TIME_KEY;

/// Copy both persisted keys from `from` into `to`, e.g. a JSON data dir into
/// a SQLite database. Keys never written in `from` are skipped.
///
/// Returns the number of keys copied.
pub async fn copy_store<A, B>(from: &A, to: &B) -> Result<usize>
where
    A: KvStore,
    B: KvStore,
{
    let mut copied = 0usize;
    for key in [ENTRIES_KEY, NEXT_AVAILABLE_TIME_KEY] {
        if let Some(value) = from.get(key).await? {
            to.set(key, value).await?;
            copied += 1;
        }
    }
    Ok(copied)
}
