//! External plan import.
//!
//! The plan generator is an opaque producer; its JSON wire format is
//! accepted as-is but validated strictly before it becomes a program.
//! A rejected plan yields a structured `PlanValidation` error so the
//! caller can log it and fall back to the default program.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Plan file wire format (matches the external generator's output)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFile {
    pub program_name: String,
    pub weeks: u32,
    pub schedule: Vec<PlanDay>,
    pub progression_notes: Option<String>,
}

/// One weekday entry in the plan
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    pub day: String,
    pub focus: String,
    pub exercises: Vec<PlanExercise>,
}

/// One exercise within a plan day
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanExercise {
    pub name: String,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub notes: Option<String>,
}

/// Longest weekly pattern a plan may replicate
const MAX_PLAN_WEEKS: u32 = 52;

/// Import a plan file and convert it into a program
///
/// The weekly pattern in `schedule` is replicated across all `weeks`
/// weeks of the cycle.
pub fn import_plan(path: &Path, anchor: NaiveDate) -> Result<Program> {
    let contents = std::fs::read_to_string(path)?;
    let plan: PlanFile = serde_json::from_str(&contents)
        .map_err(|e| Error::PlanValidation(format!("malformed plan JSON: {}", e)))?;
    plan_to_program(plan, anchor)
}

/// Validate a parsed plan and build the corresponding program
pub fn plan_to_program(plan: PlanFile, anchor: NaiveDate) -> Result<Program> {
    validate_plan(&plan)?;

    let mut templates = HashMap::new();
    let mut slots_by_weekday: [ScheduleSlot; 7] = [
        ScheduleSlot::Rest,
        ScheduleSlot::Rest,
        ScheduleSlot::Rest,
        ScheduleSlot::Rest,
        ScheduleSlot::Rest,
        ScheduleSlot::Rest,
        ScheduleSlot::Rest,
    ];

    for entry in &plan.schedule {
        let weekday = weekday_from_name(&entry.day)
            .ok_or_else(|| Error::PlanValidation(format!("unrecognized day '{}'", entry.day)))?;

        let template_id = slugify(&entry.focus);
        let exercises = entry
            .exercises
            .iter()
            .map(|e| ExerciseSpec {
                id: slugify(&e.name),
                name: e.name.clone(),
                info: exercise_info(e),
                category: exercise_category(&e.name),
            })
            .collect::<Vec<_>>();

        let estimated_minutes = 10 + 5 * exercises.len() as u32;
        templates.insert(
            template_id.clone(),
            WorkoutTemplate {
                id: template_id.clone(),
                title: entry.focus.clone(),
                subtitle: format!("{} exercises", exercises.len()),
                estimated_minutes,
                exercises,
            },
        );

        slots_by_weekday[weekday] = ScheduleSlot::Workout(template_id);
    }

    let week = Week {
        slots: slots_by_weekday.to_vec(),
    };

    let program = Program {
        name: plan.program_name,
        anchor,
        weeks: vec![week; plan.weeks as usize],
        templates,
        progression_notes: plan.progression_notes,
    };

    let errors = program.validate();
    if !errors.is_empty() {
        return Err(Error::PlanValidation(format!(
            "imported plan produced an invalid program: {}",
            errors.join("; ")
        )));
    }

    tracing::info!(
        "Imported plan '{}' ({} weeks, {} templates)",
        program.name,
        program.cycle_weeks(),
        program.templates.len()
    );
    Ok(program)
}

fn validate_plan(plan: &PlanFile) -> Result<()> {
    if plan.program_name.trim().is_empty() {
        return Err(Error::PlanValidation("empty program name".into()));
    }
    if plan.weeks == 0 {
        return Err(Error::PlanValidation("weeks must be at least 1".into()));
    }
    if plan.weeks > MAX_PLAN_WEEKS {
        return Err(Error::PlanValidation(format!(
            "weeks {} exceeds the maximum of {}",
            plan.weeks, MAX_PLAN_WEEKS
        )));
    }
    if plan.schedule.is_empty() {
        return Err(Error::PlanValidation("schedule has no days".into()));
    }

    let mut seen_days = HashSet::new();
    for entry in &plan.schedule {
        let weekday = weekday_from_name(&entry.day)
            .ok_or_else(|| Error::PlanValidation(format!("unrecognized day '{}'", entry.day)))?;
        if !seen_days.insert(weekday) {
            return Err(Error::PlanValidation(format!(
                "duplicate schedule entry for {}",
                entry.day
            )));
        }
        if entry.focus.trim().is_empty() {
            return Err(Error::PlanValidation(format!(
                "empty focus for {}",
                entry.day
            )));
        }
        if entry.exercises.is_empty() {
            return Err(Error::PlanValidation(format!(
                "no exercises for {}",
                entry.day
            )));
        }
        for exercise in &entry.exercises {
            if exercise.name.trim().is_empty() {
                return Err(Error::PlanValidation(format!(
                    "unnamed exercise on {}",
                    entry.day
                )));
            }
        }
    }

    Ok(())
}

/// Weekday index (Monday = 0) from a producer day name
fn weekday_from_name(name: &str) -> Option<usize> {
    match name.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(0),
        "tuesday" | "tue" | "tues" => Some(1),
        "wednesday" | "wed" => Some(2),
        "thursday" | "thu" | "thurs" => Some(3),
        "friday" | "fri" => Some(4),
        "saturday" | "sat" => Some(5),
        "sunday" | "sun" => Some(6),
        _ => None,
    }
}

/// Set/rep shorthand for the info string
fn exercise_info(exercise: &PlanExercise) -> String {
    match (exercise.sets, exercise.reps) {
        (Some(sets), Some(reps)) => format!("{}x{}", sets, reps),
        (Some(sets), None) => format!("{} sets", sets),
        (None, Some(reps)) => format!("{} reps", reps),
        (None, None) => exercise.notes.clone().unwrap_or_default(),
    }
}

fn exercise_category(name: &str) -> ExerciseCategory {
    let lower = name.to_lowercase();
    if lower.contains("warm") {
        ExerciseCategory::Warmup
    } else if lower.contains("stretch") || lower.contains("cool") {
        ExerciseCategory::Cooldown
    } else {
        ExerciseCategory::Main
    }
}

fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}
