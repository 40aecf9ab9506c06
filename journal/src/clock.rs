use std::sync::Mutex;

use chrono::DateTime;
use chrono::Days;
use chrono::FixedOffset;
use chrono::Local;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeDelta;
use chrono::TimeZone;
use chrono::Utc;

/// Source of "now" and of the local calendar.
///
/// All day arithmetic goes through here so that "one per day" means the
/// user's local calendar day rather than a rolling 24h window.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar date containing `at`.
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate;

    /// First instant of `date` in local time.
    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc>;

    /// Midnight that starts the local day after the one containing `at`.
    fn next_local_midnight(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.local_date(at).checked_add_days(Days::new(1)) {
            Some(tomorrow) => self.local_midnight(tomorrow),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }
}

/// Wall clock in the host's local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&Local).date_naive()
    }

    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        first_valid_instant(&Local, date.and_time(chrono::NaiveTime::MIN))
    }
}

/// Resolve a local wall-clock time that may fall into a DST gap by stepping
/// forward to the first time that exists.
fn first_valid_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let mut probe = naive;
    for _ in 0..=8 {
        if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
            return dt.with_timezone(&Utc);
        }
        probe += TimeDelta::minutes(15);
    }
    naive.and_utc()
}

/// Settable clock with a fixed UTC offset.
#[derive(Debug)]
pub struct ManualClock {
    offset: FixedOffset,
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(offset: FixedOffset, now: DateTime<Utc>) -> Self {
        Self {
            offset,
            now: Mutex::new(now),
        }
    }

    /// Clock positioned at a local wall-clock time, e.g. `"2024-06-01T23:59:00"`.
    /// Returns `None` when `local` does not parse.
    pub fn at_local(offset: FixedOffset, local: &str) -> Option<Self> {
        let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S").ok()?;
        let now = offset.from_local_datetime(&naive).single()?;
        Some(Self::new(offset, now.with_timezone(&Utc)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        first_valid_instant(&self.offset, date.and_time(chrono::NaiveTime::MIN))
    }
}

/// Epoch milliseconds as stored under `nextAvailableTime`.
pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
}
