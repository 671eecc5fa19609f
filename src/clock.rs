//! Clock abstraction for deterministic time handling.
//!
//! Engine components never read the wall clock themselves; they take time
//! from a [`Clock`] so tests and replays can pin "now" to a fixed instant.
//! Day keys are UTC calendar dates.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current time and calendar day keys
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Today's day key in the reference timezone (UTC)
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Yesterday's day key
    fn yesterday(&self) -> NaiveDate {
        previous_day(self.today())
    }
}

/// Calendar-safe predecessor of a day key (month, year and leap boundaries)
pub fn previous_day(day: NaiveDate) -> NaiveDate {
    // pred_opt only fails at NaiveDate::MIN
    day.pred_opt().unwrap_or(day)
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant, for tests and deterministic replay
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
