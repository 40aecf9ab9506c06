//! One entry per local calendar day.
//!
//! The gate is either open (a capture may be saved) or closed until the next
//! local midnight. Its state is never cached: every call re-derives it from
//! the entry collection and the stored deadline.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use crate::clock::Clock;
use crate::collaborators::CaptureSource;
use crate::deadline;
use crate::error::Result;
use crate::repository::EntryRepository;
use crate::store::KvStore;
use crate::types::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Closed { deadline: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Saved(Entry),
    /// Today already has an entry; the capture was discarded.
    Rejected { deadline: DateTime<Utc> },
}

/// Result of reconciling persisted state when the popup opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenState {
    Open,
    Closed { deadline: DateTime<Utc> },
    /// A stored deadline had already passed and was cleared just now; the
    /// caller should tell the user they may capture again.
    Reopened,
}

pub struct EligibilityGate<S> {
    store: Arc<S>,
    repo: EntryRepository<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for EligibilityGate<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            repo: self.repo.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: KvStore> EligibilityGate<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo: EntryRepository::new(Arc::clone(&store)),
            store,
            clock,
        }
    }

    pub fn repository(&self) -> &EntryRepository<S> {
        &self.repo
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Exact local calendar-day match against `now`.
    pub fn is_same_day(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        self.clock.local_date(entry.date) == self.clock.local_date(now)
    }

    /// Current state, read fresh. Does not write anything.
    pub async fn evaluate(&self) -> Result<GateState> {
        let now = self.clock.now();
        if self.has_entry_for(now).await? {
            let deadline = match deadline::read_deadline(self.store.as_ref()).await? {
                Some(d) if d > now => d,
                _ => self.clock.next_local_midnight(now),
            };
            return Ok(GateState::Closed { deadline });
        }
        Ok(GateState::Open)
    }

    /// The only way new entries are created.
    ///
    /// The image is captured only when the gate is open. A rejected attempt
    /// persists the deadline but never replaces a stored one that is still
    /// in the future.
    pub async fn attempt_capture(
        &self,
        message: &str,
        capture: &dyn CaptureSource,
    ) -> Result<CaptureOutcome> {
        let now = self.clock.now();
        if self.has_entry_for(now).await? {
            let deadline = self.close(now).await?;
            tracing::info!(%deadline, "capture rejected, already have an entry today");
            return Ok(CaptureOutcome::Rejected { deadline });
        }
        let image = capture.capture()?;
        let entry = Entry::new(message, image, now);
        self.repo.append(entry.clone()).await?;
        tracing::info!(date = %entry.date, "entry saved");
        Ok(CaptureOutcome::Saved(entry))
    }

    /// Re-derive the gate from persisted data when the popup opens.
    pub async fn on_open(&self) -> Result<OpenState> {
        let now = self.clock.now();
        if self.has_entry_for(now).await? {
            let deadline = self.close(now).await?;
            return Ok(OpenState::Closed { deadline });
        }
        if deadline::clear_if_elapsed(self.store.as_ref(), now).await? {
            return Ok(OpenState::Reopened);
        }
        Ok(OpenState::Open)
    }

    /// Closed to open once the deadline has passed. Shared with the
    /// reminder scheduler; `true` only for the call that did the clear.
    pub async fn reopen_if_elapsed(&self) -> Result<bool> {
        deadline::clear_if_elapsed(self.store.as_ref(), self.clock.now()).await
    }

    async fn has_entry_for(&self, now: DateTime<Utc>) -> Result<bool> {
        let entries = self.repo.list().await?;
        Ok(entries.iter().any(|e| self.is_same_day(e, now)))
    }

    /// Persist the deadline unless a future one is already stored, and
    /// return whichever is in effect.
    async fn close(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        if let Some(existing) = deadline::read_deadline(self.store.as_ref()).await?
            && existing > now
        {
            return Ok(existing);
        }
        let deadline = self.clock.next_local_midnight(now);
        deadline::write_deadline(self.store.as_ref(), deadline).await?;
        Ok(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::JournalError;
    use crate::store::memory::MemoryStore;
    use crate::types::ImageRef;
    use chrono::FixedOffset;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    struct StillImage;

    impl CaptureSource for StillImage {
        fn capture(&self) -> Result<ImageRef> {
            Ok(ImageRef::from_bytes("image/png", b"frame"))
        }
    }

    struct NoCamera;

    impl CaptureSource for NoCamera {
        fn capture(&self) -> Result<ImageRef> {
            Err(JournalError::CaptureUnavailable("no device".to_string()))
        }
    }

    fn gate_at(local: &str) -> (EligibilityGate<MemoryStore>, Arc<ManualClock>) {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let clock = Arc::new(ManualClock::at_local(offset, local).unwrap());
        let gate = EligibilityGate::new(Arc::new(MemoryStore::new()), clock.clone());
        (gate, clock)
    }

    #[tokio::test]
    async fn same_day_is_calendar_day_not_rolling_window() {
        let (gate, clock) = gate_at("2024-06-01T23:00:00");
        gate.attempt_capture("late", &StillImage).await.unwrap();

        // two hours later is a new local day even though < 24h passed
        clock.advance(TimeDelta::hours(2));
        assert_eq!(gate.evaluate().await.unwrap(), GateState::Open);
    }

    #[tokio::test]
    async fn evaluate_reports_closed_without_writing() {
        let (gate, _clock) = gate_at("2024-06-01T08:00:00");
        gate.attempt_capture("hi", &StillImage).await.unwrap();
        let state = gate.evaluate().await.unwrap();
        assert!(matches!(state, GateState::Closed { .. }));
        assert_eq!(deadline::read_deadline(gate.store.as_ref()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn capture_failure_writes_nothing() {
        let (gate, _clock) = gate_at("2024-06-01T08:00:00");
        let err = gate.attempt_capture("hi", &NoCamera).await.unwrap_err();
        assert!(matches!(err, JournalError::CaptureUnavailable(_)));
        assert!(gate.repository().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_attempt_keeps_first_deadline() {
        let (gate, clock) = gate_at("2024-06-01T08:00:00");
        gate.attempt_capture("first", &StillImage).await.unwrap();
        let CaptureOutcome::Rejected { deadline: first } =
            gate.attempt_capture("again", &StillImage).await.unwrap()
        else {
            panic!("expected rejection");
        };

        // a deadline written by someone else stays authoritative
        let later = first + TimeDelta::hours(3);
        deadline::write_deadline(gate.store.as_ref(), later).await.unwrap();
        clock.advance(TimeDelta::hours(1));
        let outcome = gate.attempt_capture("third", &StillImage).await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Rejected { deadline: later });
    }

    #[tokio::test]
    async fn on_open_recomputes_missing_deadline_for_todays_entry() {
        let (gate, clock) = gate_at("2024-06-01T08:00:00");
        gate.attempt_capture("hi", &StillImage).await.unwrap();
        let expected = clock.next_local_midnight(clock.now());
        assert_eq!(
            gate.on_open().await.unwrap(),
            OpenState::Closed { deadline: expected }
        );
        assert_eq!(
            deadline::read_deadline(gate.store.as_ref()).await.unwrap(),
            Some(expected)
        );
    }

    #[tokio::test]
    async fn on_open_clears_elapsed_deadline_once() {
        let (gate, clock) = gate_at("2024-06-01T08:00:00");
        gate.attempt_capture("hi", &StillImage).await.unwrap();
        gate.attempt_capture("again", &StillImage).await.unwrap();

        clock.advance(TimeDelta::days(1));
        assert_eq!(gate.on_open().await.unwrap(), OpenState::Reopened);
        assert_eq!(gate.on_open().await.unwrap(), OpenState::Open);
    }
}
