//! Built-in workout templates and the default program.
//!
//! The default program is a 4-week repeating cycle: three loading weeks
//! followed by a deload week. It is used whenever no plan has been
//! imported, and as the fallback when an imported plan fails validation.

use crate::calendar;
use crate::error::{Error, Result};
use crate::types::*;
use chrono::NaiveDate;
use fs2::FileExt;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Cycle length of the default program, in weeks
pub const DEFAULT_CYCLE_WEEKS: usize = 4;

/// Cached built-in templates - built once and reused across all operations
static DEFAULT_TEMPLATES: Lazy<HashMap<String, WorkoutTemplate>> =
    Lazy::new(build_default_templates_internal);

/// Get a reference to the cached built-in templates
pub fn get_default_templates() -> &'static HashMap<String, WorkoutTemplate> {
    &DEFAULT_TEMPLATES
}

/// Builds the built-in workout templates
///
/// **Note**: For production use, prefer `get_default_templates()` which
/// returns a cached reference. This function is retained for testing and
/// custom catalog creation.
pub fn build_default_templates() -> HashMap<String, WorkoutTemplate> {
    build_default_templates_internal()
}

fn exercise(id: &str, name: &str, info: &str, category: ExerciseCategory) -> ExerciseSpec {
    ExerciseSpec {
        id: id.into(),
        name: name.into(),
        info: info.into(),
        category,
    }
}

fn build_default_templates_internal() -> HashMap<String, WorkoutTemplate> {
    let mut templates = HashMap::new();

    templates.insert(
        "push_day".into(),
        WorkoutTemplate {
            id: "push_day".into(),
            title: "Push Day".into(),
            subtitle: "Chest, shoulders, triceps".into(),
            estimated_minutes: 45,
            exercises: vec![
                exercise(
                    "arm_circles",
                    "Arm Circles",
                    "2x15 each direction",
                    ExerciseCategory::Warmup,
                ),
                exercise("pushup", "Push-up", "4x10", ExerciseCategory::Main),
                exercise(
                    "overhead_press",
                    "Overhead Press",
                    "3x8",
                    ExerciseCategory::Main,
                ),
                exercise("dip", "Dip", "3x6", ExerciseCategory::Main),
                exercise(
                    "chest_stretch",
                    "Doorway Chest Stretch",
                    "60s each side",
                    ExerciseCategory::Cooldown,
                ),
            ],
        },
    );

    templates.insert(
        "pull_day".into(),
        WorkoutTemplate {
            id: "pull_day".into(),
            title: "Pull Day".into(),
            subtitle: "Back and biceps".into(),
            estimated_minutes: 45,
            exercises: vec![
                exercise(
                    "band_pull_apart",
                    "Band Pull-apart",
                    "2x15",
                    ExerciseCategory::Warmup,
                ),
                exercise("pullup", "Pull-up", "4x6", ExerciseCategory::Main),
                exercise(
                    "bent_over_row",
                    "Bent-over Row",
                    "3x10",
                    ExerciseCategory::Main,
                ),
                exercise("biceps_curl", "Biceps Curl", "3x12", ExerciseCategory::Main),
                exercise(
                    "lat_stretch",
                    "Lat Stretch",
                    "60s each side",
                    ExerciseCategory::Cooldown,
                ),
            ],
        },
    );

    templates.insert(
        "leg_day".into(),
        WorkoutTemplate {
            id: "leg_day".into(),
            title: "Leg Day".into(),
            subtitle: "Squat pattern and posterior chain".into(),
            estimated_minutes: 50,
            exercises: vec![
                exercise(
                    "leg_swings",
                    "Leg Swings",
                    "2x12 each leg",
                    ExerciseCategory::Warmup,
                ),
                exercise("goblet_squat", "Goblet Squat", "4x8", ExerciseCategory::Main),
                exercise(
                    "romanian_deadlift",
                    "Romanian Deadlift",
                    "3x10",
                    ExerciseCategory::Main,
                ),
                exercise("walking_lunge", "Walking Lunge", "3x10 each leg", ExerciseCategory::Main),
                exercise(
                    "quad_stretch",
                    "Standing Quad Stretch",
                    "45s each side",
                    ExerciseCategory::Cooldown,
                ),
            ],
        },
    );

    templates.insert(
        "conditioning".into(),
        WorkoutTemplate {
            id: "conditioning".into(),
            title: "Conditioning".into(),
            subtitle: "Intervals and engine work".into(),
            estimated_minutes: 30,
            exercises: vec![
                exercise(
                    "easy_jog",
                    "Easy Jog",
                    "5 min conversational pace",
                    ExerciseCategory::Warmup,
                ),
                exercise(
                    "intervals",
                    "Run Intervals",
                    "6x400m, 90s rest",
                    ExerciseCategory::Main,
                ),
                exercise(
                    "walk_down",
                    "Walk Cooldown",
                    "5 min easy",
                    ExerciseCategory::Cooldown,
                ),
            ],
        },
    );

    templates.insert(
        "mobility_flow".into(),
        WorkoutTemplate {
            id: "mobility_flow".into(),
            title: "Mobility Flow".into(),
            subtitle: "Hips, shoulders, spine".into(),
            estimated_minutes: 20,
            exercises: vec![
                exercise(
                    "cat_cow",
                    "Cat-Cow",
                    "10 slow reps",
                    ExerciseCategory::Warmup,
                ),
                exercise("hip_cars", "Hip CARs", "3 each side", ExerciseCategory::Main),
                exercise(
                    "shoulder_cars",
                    "Shoulder CARs",
                    "3 each side",
                    ExerciseCategory::Main,
                ),
                exercise(
                    "deep_squat_hold",
                    "Deep Squat Hold",
                    "2x45s",
                    ExerciseCategory::Main,
                ),
                exercise(
                    "childs_pose",
                    "Child's Pose",
                    "90s",
                    ExerciseCategory::Cooldown,
                ),
            ],
        },
    );

    templates
}

/// Build the default 4-week program anchored at a start date
///
/// Weeks 1-3 carry the full loading pattern; week 4 is a deload with
/// only conditioning and mobility.
pub fn default_program(anchor: NaiveDate) -> Program {
    use ScheduleSlot::{Rest, Workout};

    let loading_week = Week {
        slots: vec![
            Workout("push_day".into()),     // Monday
            Workout("pull_day".into()),     // Tuesday
            Workout("conditioning".into()), // Wednesday
            Rest,                           // Thursday
            Workout("leg_day".into()),      // Friday
            Workout("mobility_flow".into()), // Saturday
            Rest,                           // Sunday
        ],
    };

    let deload_week = Week {
        slots: vec![
            Workout("mobility_flow".into()),
            Rest,
            Workout("conditioning".into()),
            Rest,
            Workout("mobility_flow".into()),
            Rest,
            Rest,
        ],
    };

    Program {
        name: "Foundation Block".into(),
        anchor,
        weeks: vec![
            loading_week.clone(),
            loading_week.clone(),
            loading_week,
            deload_week,
        ],
        templates: get_default_templates().clone(),
        progression_notes: Some(
            "Add one rep per main exercise each loading week; deload on week 4.".into(),
        ),
    }
}

impl Program {
    /// Validate the program for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push("Program has empty name".to_string());
        }
        if self.weeks.is_empty() {
            errors.push("Program has no weeks".to_string());
        }

        for (week_index, week) in self.weeks.iter().enumerate() {
            if week.slots.len() != 7 {
                errors.push(format!(
                    "Week {} has {} slots, expected 7",
                    week_index + 1,
                    week.slots.len()
                ));
            }

            // Check that all referenced templates exist
            for slot in &week.slots {
                if let ScheduleSlot::Workout(template_id) = slot {
                    if !self.templates.contains_key(template_id) {
                        errors.push(format!(
                            "Week {} references non-existent template '{}'",
                            week_index + 1,
                            template_id
                        ));
                    }
                }
            }
        }

        for (id, template) in &self.templates {
            if id.is_empty() || template.id.is_empty() {
                errors.push("Template has empty ID".to_string());
            }
            if id != &template.id {
                errors.push(format!(
                    "Template key '{}' doesn't match template.id '{}'",
                    id, template.id
                ));
            }
            if template.title.is_empty() {
                errors.push(format!("Template '{}' has empty title", id));
            }
            if template.exercises.is_empty() {
                errors.push(format!("Template '{}' has no exercises", id));
            }
        }

        errors
    }

    /// Load a program from a file with shared locking
    ///
    /// Returns `None` if the file doesn't exist. If the file is
    /// corrupted, logs a warning and returns `None` so the caller can
    /// fall back to the default program.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::info!("No program file found at {:?}", path);
            return Ok(None);
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open program file {:?}: {}.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock program file {:?}: {}.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read program file {:?}: {}.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str::<Program>(&contents) {
            Ok(program) => {
                tracing::debug!("Loaded program '{}' from {:?}", program.name, path);
                Ok(Some(program))
            }
            Err(e) => {
                tracing::warn!("Failed to parse program file {:?}: {}.", path, e);
                Ok(None)
            }
        }
    }

    /// Save the program to a file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "program path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved program '{}' to {:?}", self.name, path);
        Ok(())
    }

    /// Load the program from `path`, or build, save and return the
    /// default program anchored at the Monday of `today`'s week
    pub fn load_or_init(path: &Path, today: NaiveDate) -> Result<Self> {
        if let Some(program) = Self::load(path)? {
            return Ok(program);
        }

        let anchor = calendar::start_of_week(today);
        let program = default_program(anchor);
        program.save(path)?;
        tracing::info!(
            "Initialized default program anchored at {}",
            program.anchor
        );
        Ok(program)
    }
}
