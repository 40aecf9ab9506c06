//! Seams to the platform: image capture and user notifications.

use crate::error::Result;
use crate::types::ImageRef;

/// Produces one still image on demand. Failures should be reported as
/// [`JournalError::CaptureUnavailable`](crate::error::JournalError::CaptureUnavailable).
pub trait CaptureSource: Send + Sync {
    fn capture(&self) -> Result<ImageRef>;
}

/// Fire-and-forget system notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}
