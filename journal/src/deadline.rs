//! Access to the `nextAvailableTime` key, shared by the gate, the countdown
//! and the reminder scheduler.
//!
//! The stored value is its own dedupe guard: whoever observes an elapsed,
//! non-zero deadline clears it, and every later observer sees `0`.

use chrono::DateTime;
use chrono::Utc;

use crate::clock::from_millis;
use crate::clock::to_millis;
use crate::error::Result;
use crate::store::KvStore;
use crate::store::NEXT_AVAILABLE_TIME_KEY;
use crate::store::read_or;
use crate::store::write;

/// Stored deadline, `None` when the key holds `0` or was never written.
pub async fn read_deadline<S: KvStore + ?Sized>(store: &S) -> Result<Option<DateTime<Utc>>> {
    let ms: i64 = read_or(store, NEXT_AVAILABLE_TIME_KEY, 0).await?;
    if ms == 0 {
        return Ok(None);
    }
    Ok(from_millis(ms))
}

pub async fn write_deadline<S: KvStore + ?Sized>(store: &S, deadline: DateTime<Utc>) -> Result<()> {
    write(store, NEXT_AVAILABLE_TIME_KEY, &to_millis(deadline)).await
}

pub async fn clear_deadline<S: KvStore + ?Sized>(store: &S) -> Result<()> {
    write(store, NEXT_AVAILABLE_TIME_KEY, &0i64).await
}

/// Clear the deadline if it is set and `now` has reached it.
///
/// Returns `true` only for the caller that performed the clear; a second
/// call after a successful clear reads `0` and returns `false`. Two contexts
/// racing here may both clear, which leaves the same `0` behind.
pub async fn clear_if_elapsed<S: KvStore + ?Sized>(store: &S, now: DateTime<Utc>) -> Result<bool> {
    match read_deadline(store).await? {
        Some(deadline) if deadline <= now => {
            clear_deadline(store).await?;
            tracing::info!(%deadline, "deadline elapsed, cleared");
            Ok(true)
        }
        _ => Ok(false),
    }
}
