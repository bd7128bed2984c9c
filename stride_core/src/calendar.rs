//! Pure date arithmetic and the injected clock.
//!
//! Everything here works at day granularity over `NaiveDate`; time-of-day
//! is only relevant to `same_day`, which compares instants after
//! truncating to their calendar date.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Whole days from `from` to `to` (negative if `to` precedes `from`)
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// The date `days` whole days away from `date`
pub fn offset_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Monday of the week containing `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 is valid for every month")
}

/// Weekday index with Monday = 0
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

/// Whether two instants fall on the same calendar day (UTC)
pub fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

// ============================================================================
// Clock
// ============================================================================

/// Source of "now", injected so callers never reach for ambient time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock implementation
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for tests and deterministic CLI runs
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Pin the clock to noon UTC on the given date
    pub fn at_date(date: NaiveDate) -> Self {
        let now = date
            .and_hms_opt(12, 0, 0)
            .expect("noon is a valid time")
            .and_utc();
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
