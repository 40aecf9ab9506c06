use std::time::Duration;

use crate::error::JournalError;
use crate::error::Result;
use crate::repository::EntryRepository;
use crate::store::KvStore;
use crate::types::ImageRef;

/// Delay between frames.
pub const FRAME_DELAY: Duration = Duration::from_millis(100);

/// Consumes frames in display order; encoding is up to the implementation.
pub trait FrameSink {
    type Output;

    fn push_frame(&mut self, index: usize, image: &ImageRef, delay: Duration) -> Result<()>;
    fn finish(self) -> Result<Self::Output>;
}

/// Feed every stored image to `sink`, oldest first.
pub async fn compile_timelapse<S, F>(repo: &EntryRepository<S>, mut sink: F) -> Result<F::Output>
where
    S: KvStore,
    F: FrameSink,
{
    let entries = repo.list().await?;
    if entries.is_empty() {
        return Err(JournalError::NoEntries);
    }
    for (index, entry) in entries.iter().enumerate() {
        sink.push_frame(index, &entry.image, FRAME_DELAY)?;
    }
    tracing::info!(frames = entries.len(), "timelapse compiled");
    sink.finish()
}
