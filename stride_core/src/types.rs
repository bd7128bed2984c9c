//! Core domain types for the Stride training companion.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout templates and their exercises
//! - The repeating multi-week program and its schedule slots
//! - Session records and reflection metadata
//! - Derived aggregates (stats, phase, day status)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Workout Template Types
// ============================================================================

/// Category of an exercise within a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Warmup,
    Main,
    Cooldown,
}

/// A single exercise within a workout template
///
/// `info` is a free-text shorthand for the prescription, e.g. "3x10" or
/// "8 min easy pace".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseSpec {
    pub id: String,
    pub name: String,
    pub info: String,
    pub category: ExerciseCategory,
}

/// A named workout definition (e.g., "Push Day")
///
/// Templates are defined once and referenced by id from schedule slots;
/// they are never mutated after creation. Session records snapshot the
/// whole template by value so later edits cannot rewrite history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutTemplate {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub estimated_minutes: u32,
    pub exercises: Vec<ExerciseSpec>,
}

// ============================================================================
// Program and Schedule Types
// ============================================================================

/// One weekday's assignment within a week
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSlot {
    /// A scheduled workout, referencing a template by id
    Workout(String),
    /// No workout planned
    Rest,
}

/// One week of the program: exactly 7 slots, Monday-first
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Week {
    pub slots: Vec<ScheduleSlot>,
}

/// The full repeating multi-week schedule definition
///
/// Date resolution reduces elapsed days modulo `weeks.len() * 7`, so the
/// schedule repeats indefinitely after the last week. The phase plan uses
/// its own independent length (see `phase`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub anchor: NaiveDate,
    pub weeks: Vec<Week>,
    pub templates: HashMap<String, WorkoutTemplate>,
    pub progression_notes: Option<String>,
}

impl Program {
    /// Cycle length in weeks
    pub fn cycle_weeks(&self) -> usize {
        self.weeks.len()
    }

    /// Look up a template by id
    pub fn template(&self, id: &str) -> Option<&WorkoutTemplate> {
        self.templates.get(id)
    }
}

// ============================================================================
// Session and Reflection Types
// ============================================================================

/// Outcome of a logged session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    Skipped,
}

/// Reason code attached to a skipped session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoTime,
    Fatigue,
    Injury,
    Travel,
    Other(String),
}

impl SkipReason {
    /// Parse a producer-supplied reason code (case-insensitive)
    pub fn parse(s: &str) -> SkipReason {
        match s.to_lowercase().as_str() {
            "no_time" | "notime" | "time" => SkipReason::NoTime,
            "fatigue" | "tired" => SkipReason::Fatigue,
            "injury" | "injured" => SkipReason::Injury,
            "travel" | "travelling" | "traveling" => SkipReason::Travel,
            other => SkipReason::Other(other.to_string()),
        }
    }
}

/// User-supplied subjective metadata attached to a session
///
/// The tag set is capped at 3 by the producer, not enforced here.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ReflectionData {
    /// Effort rating 1-10, absent if not given
    pub effort: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
    /// Only meaningful on skipped records
    pub skip_reason: Option<SkipReason>,
}

/// One logged real-world outcome for a specific date
///
/// Created exactly once (on complete/skip), mutated at most once more to
/// attach reflection metadata, and deleted only by the reset-today
/// operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    /// Day granularity; time-of-day lives in `recorded_at`
    pub date: NaiveDate,
    /// Explicit sort key for newest-first ordering
    pub recorded_at: DateTime<Utc>,
    /// Snapshotted by value, not by id
    pub workout: WorkoutTemplate,
    pub status: SessionStatus,
    /// Streak value captured at creation time
    pub streak: u32,
    pub reflection: Option<ReflectionData>,
    /// Per-exercise completion flags, keyed by exercise id
    pub exercise_progress: Option<HashMap<String, Vec<bool>>>,
}

// ============================================================================
// Derived Aggregate Types
// ============================================================================

/// Aggregates derived from the ledger; a cache, never a source of truth
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DerivedStats {
    pub total_completed: u32,
    pub this_month_completed: u32,
    /// Rounded percentage 0-100 of completed over (completed + skipped)
    pub completion_rate: u32,
}

/// Coarse label for elapsed program time, display-only
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseLabel {
    Base,
    Build,
    Peak,
    Taper,
}

/// Phase classifier output for one date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseInfo {
    /// 1-based week number within the phase plan
    pub week_number: u32,
    pub label: PhaseLabel,
    pub progress_percent: u32,
}

/// Join of the ledger and the schedule resolver for one date
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// A completed session is logged for the date
    Completed,
    /// A skipped session is logged for the date
    Skipped,
    /// A workout is scheduled but nothing is logged yet
    Pending,
    /// No workout scheduled for the date
    Rest,
    /// The date precedes the program anchor
    NotStarted,
}
