//! Streak and stats aggregation over the session ledger.
//!
//! Everything here is a pure O(n) scan re-derived from scratch on every
//! call; no incremental counter is ever trusted as authoritative.

use crate::calendar;
use crate::ledger::Ledger;
use crate::types::{DerivedStats, SessionStatus};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Current streak: consecutive calendar days with a completed session
///
/// The walk starts at `today` if a completed record exists for it.
/// Otherwise one day of grace applies: a still-pending today (no record
/// of any status) lets a streak ending yesterday stay active. A skipped
/// record for today kills the grace.
pub fn compute_streak(ledger: &Ledger, today: NaiveDate) -> u32 {
    let completed = completed_dates(ledger);

    if completed.contains(&today) {
        return consecutive_through(&completed, today);
    }

    let any_record_today = ledger.records().iter().any(|r| r.date == today);
    let yesterday = calendar::offset_days(today, -1);
    if !any_record_today && completed.contains(&yesterday) {
        return consecutive_through(&completed, yesterday);
    }

    0
}

/// Consecutive completed days ending at `day`, inclusive
///
/// Used by the store to capture the streak value a new completion will
/// produce before the record exists.
pub fn consecutive_completed_through(ledger: &Ledger, day: NaiveDate) -> u32 {
    consecutive_through(&completed_dates(ledger), day)
}

/// Monthly and lifetime aggregates for a reference date
pub fn compute_stats(ledger: &Ledger, reference_date: NaiveDate) -> DerivedStats {
    let month_start = calendar::first_of_month(reference_date);

    let mut total_completed = 0u32;
    let mut this_month_completed = 0u32;
    let mut skipped = 0u32;

    for record in ledger.records() {
        match record.status {
            SessionStatus::Completed => {
                total_completed += 1;
                if record.date >= month_start {
                    this_month_completed += 1;
                }
            }
            SessionStatus::Skipped => skipped += 1,
        }
    }

    let denominator = total_completed + skipped;
    let completion_rate = if denominator == 0 {
        0
    } else {
        (100.0 * total_completed as f64 / denominator as f64).round() as u32
    };

    DerivedStats {
        total_completed,
        this_month_completed,
        completion_rate,
    }
}

fn completed_dates(ledger: &Ledger) -> HashSet<NaiveDate> {
    ledger
        .records()
        .iter()
        .filter(|r| r.status == SessionStatus::Completed)
        .map(|r| r.date)
        .collect()
}

fn consecutive_through(completed: &HashSet<NaiveDate>, day: NaiveDate) -> u32 {
    let mut count = 0;
    let mut cursor = day;
    while completed.contains(&cursor) {
        count += 1;
        cursor = calendar::offset_days(cursor, -1);
    }
    count
}
