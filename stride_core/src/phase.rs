//! Phase classification of elapsed program time.
//!
//! The phase plan is linear and display-only. Its length is a
//! configuration parameter independent of the schedule's repeating cycle
//! length; the two are deliberately not reconciled (the schedule keeps
//! cycling after the phase plan runs out).

use crate::calendar;
use crate::types::{PhaseInfo, PhaseLabel};
use chrono::NaiveDate;

/// Default phase plan length in weeks
pub const DEFAULT_TOTAL_WEEKS: u32 = 16;

/// Classify a date within the phase plan
///
/// Returns `None` outside `[anchor, anchor + total_weeks)` and for a
/// zero-length plan. The label is a step function over quarters of
/// `total_weeks`.
pub fn classify(date: NaiveDate, anchor: NaiveDate, total_weeks: u32) -> Option<PhaseInfo> {
    if total_weeks == 0 {
        return None;
    }

    let elapsed = calendar::days_between(anchor, date);
    if elapsed < 0 {
        return None;
    }

    let week_number = (elapsed / 7) as u32 + 1;
    if week_number > total_weeks {
        return None;
    }

    let label = label_for_week(week_number, total_weeks);
    let progress_percent = (week_number * 100 / total_weeks).min(100);

    Some(PhaseInfo {
        week_number,
        label,
        progress_percent,
    })
}

/// Step function mapping a week to its quarter of the plan
fn label_for_week(week_number: u32, total_weeks: u32) -> PhaseLabel {
    debug_assert!(week_number >= 1 && week_number <= total_weeks);

    match (week_number - 1) * 4 / total_weeks {
        0 => PhaseLabel::Base,
        1 => PhaseLabel::Build,
        2 => PhaseLabel::Peak,
        _ => PhaseLabel::Taper,
    }
}
