//! Schedule resolution: mapping calendar dates to planned workouts.
//!
//! Resolution is a pure function of the program and the target date.
//! Elapsed days are reduced modulo the cycle length, so the schedule
//! repeats indefinitely after the last week.

use crate::calendar;
use crate::types::{Program, ScheduleSlot, WorkoutTemplate};
use chrono::NaiveDate;

/// Resolve the workout(s) planned for a date
///
/// Returns an empty Vec for rest days and for dates before the program
/// anchor. A date exactly one full cycle after the anchor maps to the
/// same slot as the anchor itself.
pub fn resolve<'a>(program: &'a Program, date: NaiveDate) -> Vec<&'a WorkoutTemplate> {
    slot_for_date(program, date)
        .and_then(|slot| match slot {
            ScheduleSlot::Workout(template_id) => {
                let template = program.template(template_id);
                if template.is_none() {
                    tracing::warn!(
                        "Slot for {} references unknown template '{}'",
                        date,
                        template_id
                    );
                }
                template
            }
            ScheduleSlot::Rest => None,
        })
        .into_iter()
        .collect()
}

/// Resolve with today-only extra sessions appended
///
/// Extra same-day workouts are a bounded augmentation: they apply only
/// when the queried date is today, never to arbitrary dates.
pub fn resolve_with_extras<'a>(
    program: &'a Program,
    date: NaiveDate,
    today: NaiveDate,
    extras: &'a [WorkoutTemplate],
) -> Vec<&'a WorkoutTemplate> {
    let mut workouts = resolve(program, date);
    if date == today {
        workouts.extend(extras.iter());
    }
    workouts
}

/// Whether no workout is planned for the date
///
/// Dates before the anchor count as rest.
pub fn is_rest_day(program: &Program, date: NaiveDate) -> bool {
    resolve(program, date).is_empty()
}

/// Look up the schedule slot governing a date
fn slot_for_date(program: &Program, date: NaiveDate) -> Option<&ScheduleSlot> {
    let elapsed = calendar::days_between(program.anchor, date);
    if elapsed < 0 {
        // Program has not started
        return None;
    }

    let cycle_weeks = program.cycle_weeks();
    if cycle_weeks == 0 {
        tracing::warn!("Program '{}' has no weeks", program.name);
        return None;
    }

    let week_index = (elapsed / 7) as usize % cycle_weeks;
    let weekday_index = (elapsed % 7) as usize;

    program
        .weeks
        .get(week_index)
        .and_then(|week| week.slots.get(weekday_index))
}
