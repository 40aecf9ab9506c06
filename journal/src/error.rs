use thiserror::Error;

pub type Result<T> = std::result::Result<T, JournalError>;

#[derive(Error, Debug)]
pub enum JournalError {
    /// The persisted store could not be read or written. The in-flight
    /// operation was aborted and nothing was written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("entry index {index} out of range (have {len} entries)")]
    OutOfRange { index: usize, len: usize },

    /// The capture collaborator could not produce an image.
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("no entries to compile")]
    NoEntries,

    #[error("invalid image reference: {0}")]
    InvalidImage(String),

    #[error("config error: {0}")]
    Config(String),
}

impl JournalError {
    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        JournalError::StorageUnavailable(err.to_string())
    }
}
