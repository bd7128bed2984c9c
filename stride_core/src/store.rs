//! The aggregate training store.
//!
//! One `TrainingStore` is constructed at startup and handed to every
//! consumer; nothing here is reachable through ambient globals. It owns
//! the program, the ledger, and the persistence handle, and exposes the
//! full collaborator interface: date queries, mutations, and the derived
//! aggregates.
//!
//! Mutations are strictly sequential on the single owner: read the
//! in-memory snapshot, compute the next one, persist, publish. Persistence
//! is a bounded-retry write; after the final failed attempt the in-memory
//! snapshot stays authoritative for the rest of the session and the
//! divergence is logged.

use crate::calendar::{self, Clock};
use crate::error::{Error, Result};
use crate::kv::{KeyValueStore, KEY_HISTORY, KEY_STATS, KEY_STREAK};
use crate::ledger::Ledger;
use crate::types::*;
use crate::{phase, schedule, stats};
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

/// Write attempts before giving up on a snapshot key
const PERSIST_ATTEMPTS: u32 = 3;
/// Base backoff between write attempts
const PERSIST_BACKOFF_MS: u64 = 50;

/// Aggregate store owning the program, ledger and persistence handle
pub struct TrainingStore {
    program: Program,
    ledger: Ledger,
    streak: u32,
    stats: DerivedStats,
    phase_total_weeks: u32,
    /// Today-only bonus sessions; cleared when the day rolls over
    extras: Vec<WorkoutTemplate>,
    extras_date: Option<NaiveDate>,
    clock: Box<dyn Clock>,
    kv: Box<dyn KeyValueStore>,
}

impl TrainingStore {
    /// Open the store, loading any persisted ledger snapshot
    ///
    /// The streak and stats keys are never trusted on load; both are
    /// recomputed from the reloaded ledger.
    pub fn open(
        program: Program,
        phase_total_weeks: u32,
        clock: Box<dyn Clock>,
        kv: Box<dyn KeyValueStore>,
    ) -> Result<Self> {
        let errors = program.validate();
        if !errors.is_empty() {
            return Err(Error::ProgramValidation(errors.join("; ")));
        }

        let ledger = match kv.get(KEY_HISTORY)? {
            Some(value) => match serde_json::from_value::<Vec<SessionRecord>>(value) {
                Ok(records) => Ledger::from_records(records),
                Err(e) => {
                    tracing::warn!("Corrupt history snapshot: {}. Starting empty.", e);
                    Ledger::new()
                }
            },
            None => Ledger::new(),
        };

        tracing::info!(
            "Opened store for program '{}' with {} session(s)",
            program.name,
            ledger.len()
        );

        let mut store = Self {
            program,
            ledger,
            streak: 0,
            stats: DerivedStats::default(),
            phase_total_weeks,
            extras: Vec::new(),
            extras_date: None,
            clock,
            kv,
        };
        store.recompute();
        Ok(store)
    }

    // ========================================================================
    // Read interface
    // ========================================================================

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn stats(&self) -> &DerivedStats {
        &self.stats
    }

    /// Phase classification for today
    pub fn phase(&self) -> Option<PhaseInfo> {
        phase::classify(self.today(), self.program.anchor, self.phase_total_weeks)
    }

    /// First workout planned for a date, if any
    pub fn workout_for_date(&self, date: NaiveDate) -> Option<&WorkoutTemplate> {
        self.workouts_by_date(date).into_iter().next()
    }

    /// All workouts planned for a date (extras included when it is today)
    pub fn workouts_by_date(&self, date: NaiveDate) -> Vec<&WorkoutTemplate> {
        let extras = self.extras_for(date);
        schedule::resolve_with_extras(&self.program, date, self.today(), extras)
    }

    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.workouts_by_date(date).is_empty()
    }

    /// Ledger lookup joined against the resolver
    pub fn day_status(&self, date: NaiveDate) -> DayStatus {
        if let Some(record) = self.ledger.latest_for_date(date) {
            return match record.status {
                SessionStatus::Completed => DayStatus::Completed,
                SessionStatus::Skipped => DayStatus::Skipped,
            };
        }

        if calendar::days_between(self.program.anchor, date) < 0 {
            DayStatus::NotStarted
        } else if self.is_rest_day(date) {
            DayStatus::Rest
        } else {
            DayStatus::Pending
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Log today's workout as completed
    ///
    /// On a day with multiple scheduled workouts, the first one without a
    /// logged record is targeted.
    pub fn complete_workout(
        &mut self,
        exercise_progress: Option<HashMap<String, Vec<bool>>>,
    ) -> Result<()> {
        let today = self.today();
        let workout = self.next_unlogged_workout(today)?.clone();

        // The streak this completion produces: yesterday's chain plus one
        let captured =
            stats::consecutive_completed_through(&self.ledger, calendar::offset_days(today, -1))
                + 1;

        let record = SessionRecord {
            id: Uuid::new_v4(),
            date: today,
            recorded_at: self.clock.now(),
            workout,
            status: SessionStatus::Completed,
            streak: captured,
            reflection: None,
            exercise_progress,
        };

        self.ledger.append(record);
        self.recompute();
        self.persist();
        Ok(())
    }

    /// Log today's workout as skipped
    pub fn skip_workout(
        &mut self,
        reason: SkipReason,
        reflection: Option<ReflectionData>,
    ) -> Result<()> {
        let today = self.today();
        let workout = self.next_unlogged_workout(today)?.clone();

        // A skip keeps whatever streak a completion today already earned
        let captured = if self
            .ledger
            .records_for_date(today)
            .iter()
            .any(|r| r.status == SessionStatus::Completed)
        {
            stats::consecutive_completed_through(&self.ledger, today)
        } else {
            0
        };

        let reflection = Some(ReflectionData {
            skip_reason: Some(reason),
            ..reflection.unwrap_or_default()
        });

        let record = SessionRecord {
            id: Uuid::new_v4(),
            date: today,
            recorded_at: self.clock.now(),
            workout,
            status: SessionStatus::Skipped,
            streak: captured,
            reflection,
            exercise_progress: None,
        };

        self.ledger.append(record);
        self.recompute();
        self.persist();
        Ok(())
    }

    /// Attach reflection metadata to today's session
    pub fn set_reflection(
        &mut self,
        reflection: ReflectionData,
        workout_hint: Option<&str>,
    ) -> Result<Uuid> {
        let today = self.today();
        let id = self.ledger.merge_reflection(today, reflection, workout_hint)?;
        self.persist();
        Ok(id)
    }

    /// Remove all of today's records ("undo today")
    pub fn reset_workout(&mut self) -> Result<usize> {
        let today = self.today();
        let removed = self.ledger.remove_for_date(today);
        self.recompute();
        self.persist();
        Ok(removed)
    }

    /// Register a bonus session for today
    ///
    /// The extra is transient: it widens today's schedule until the day
    /// rolls over, and is never persisted.
    pub fn add_extra_workout(&mut self, template_id: &str) -> Result<()> {
        let today = self.today();
        let template = self
            .program
            .template(template_id)
            .ok_or_else(|| Error::Store(format!("unknown template '{}'", template_id)))?
            .clone();

        if self.extras_date != Some(today) {
            self.extras.clear();
            self.extras_date = Some(today);
        }
        tracing::info!("Registered extra workout '{}' for {}", template_id, today);
        self.extras.push(template);
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn extras_for(&self, date: NaiveDate) -> &[WorkoutTemplate] {
        if self.extras_date == Some(date) {
            &self.extras
        } else {
            &[]
        }
    }

    /// First scheduled workout for the date without a logged record
    fn next_unlogged_workout(&self, date: NaiveDate) -> Result<&WorkoutTemplate> {
        let scheduled = self.workouts_by_date(date);
        if scheduled.is_empty() {
            return Err(Error::NoWorkoutScheduled(date));
        }

        let logged: Vec<&str> = self
            .ledger
            .records_for_date(date)
            .iter()
            .map(|r| r.workout.id.as_str())
            .collect();

        scheduled
            .into_iter()
            .find(|w| !logged.contains(&w.id.as_str()))
            .ok_or_else(|| {
                Error::Store(format!("all scheduled workouts for {} already logged", date))
            })
    }

    /// Re-derive streak and stats from the ledger
    fn recompute(&mut self) {
        let today = self.today();
        self.streak = stats::compute_streak(&self.ledger, today);
        self.stats = stats::compute_stats(&self.ledger, today);
    }

    /// Write the three snapshot keys with bounded retry
    ///
    /// A key that still fails after the last attempt is logged and left
    /// divergent; the in-memory snapshot remains the session's source of
    /// truth.
    fn persist(&self) {
        let history = match serde_json::to_value(self.ledger.records()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to serialize history: {}. Skipping persist.", e);
                return;
            }
        };

        self.persist_key(KEY_HISTORY, &history);
        self.persist_key(KEY_STREAK, &serde_json::json!(self.streak));
        match serde_json::to_value(&self.stats) {
            Ok(value) => self.persist_key(KEY_STATS, &value),
            Err(e) => tracing::warn!("Failed to serialize stats: {}", e),
        }
    }

    fn persist_key(&self, key: &str, value: &serde_json::Value) {
        for attempt in 1..=PERSIST_ATTEMPTS {
            match self.kv.set(key, value) {
                Ok(()) => return,
                Err(e) if attempt < PERSIST_ATTEMPTS => {
                    tracing::warn!(
                        "Write of '{}' failed (attempt {}/{}): {}",
                        key,
                        attempt,
                        PERSIST_ATTEMPTS,
                        e
                    );
                    std::thread::sleep(std::time::Duration::from_millis(
                        PERSIST_BACKOFF_MS * attempt as u64,
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        "Write of '{}' failed after {} attempts: {}. \
                         In-memory state diverges from disk until the next successful write.",
                        key,
                        PERSIST_ATTEMPTS,
                        e
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FixedClock;
    use crate::kv::MemoryStore;
    use crate::program::default_program;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn anchor() -> NaiveDate {
        // A Monday
        d(2025, 1, 6)
    }

    fn open_store(today: NaiveDate) -> TrainingStore {
        TrainingStore::open(
            default_program(anchor()),
            phase::DEFAULT_TOTAL_WEEKS,
            Box::new(FixedClock::at_date(today)),
            Box::new(MemoryStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_open_rejects_invalid_program() {
        let mut program = default_program(anchor());
        program.weeks[0].slots.pop();

        let result = TrainingStore::open(
            program,
            16,
            Box::new(FixedClock::at_date(anchor())),
            Box::new(MemoryStore::new()),
        );
        assert!(matches!(result, Err(Error::ProgramValidation(_))));
    }

    #[test]
    fn test_date_queries() {
        let store = open_store(anchor());

        assert_eq!(store.workout_for_date(anchor()).unwrap().id, "push_day");
        assert!(store.workout_for_date(d(2025, 1, 9)).is_none());

        assert!(!store.is_rest_day(anchor()));
        assert!(store.is_rest_day(d(2025, 1, 9)));
        // Pre-anchor dates count as rest
        assert!(store.is_rest_day(d(2024, 12, 30)));
    }

    #[test]
    fn test_day_status_join() {
        let mut store = open_store(anchor());

        assert_eq!(store.day_status(d(2024, 12, 30)), DayStatus::NotStarted);
        assert_eq!(store.day_status(d(2025, 1, 9)), DayStatus::Rest); // Thursday
        assert_eq!(store.day_status(anchor()), DayStatus::Pending);

        store.complete_workout(None).unwrap();
        assert_eq!(store.day_status(anchor()), DayStatus::Completed);
    }

    #[test]
    fn test_complete_workout_captures_streak() {
        let mut store = open_store(anchor());
        store.complete_workout(None).unwrap();

        assert_eq!(store.streak(), 1);
        let record = store.ledger().latest_for_date(anchor()).unwrap();
        assert_eq!(record.streak, 1);
        assert_eq!(record.workout.id, "push_day");
        assert_eq!(store.stats().total_completed, 1);
    }

    #[test]
    fn test_complete_on_rest_day_is_error() {
        // Thursday of week 1 is rest
        let mut store = open_store(d(2025, 1, 9));
        let result = store.complete_workout(None);
        assert!(matches!(result, Err(Error::NoWorkoutScheduled(_))));
    }

    #[test]
    fn test_double_complete_is_error() {
        let mut store = open_store(anchor());
        store.complete_workout(None).unwrap();
        let result = store.complete_workout(None);
        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[test]
    fn test_skip_workout_records_reason() {
        let mut store = open_store(anchor());
        store.skip_workout(SkipReason::Fatigue, None).unwrap();

        let record = store.ledger().latest_for_date(anchor()).unwrap();
        assert_eq!(record.status, SessionStatus::Skipped);
        assert_eq!(
            record.reflection.as_ref().unwrap().skip_reason,
            Some(SkipReason::Fatigue)
        );
        assert_eq!(store.streak(), 0);
        assert_eq!(store.stats().completion_rate, 0);
    }

    #[test]
    fn test_set_reflection_targets_today() {
        let mut store = open_store(anchor());
        store.complete_workout(None).unwrap();

        let reflection = ReflectionData {
            effort: Some(7),
            tags: vec!["strong".into()],
            notes: Some("good session".into()),
            skip_reason: None,
        };
        store.set_reflection(reflection, None).unwrap();

        let record = store.ledger().latest_for_date(anchor()).unwrap();
        assert_eq!(record.reflection.as_ref().unwrap().effort, Some(7));
    }

    #[test]
    fn test_set_reflection_without_session_is_error() {
        let mut store = open_store(anchor());
        let result = store.set_reflection(ReflectionData::default(), None);
        assert!(matches!(result, Err(Error::NoSessionForDate(_))));
    }

    #[test]
    fn test_reset_workout_clears_today() {
        let mut store = open_store(anchor());
        store.complete_workout(None).unwrap();
        assert_eq!(store.streak(), 1);

        let removed = store.reset_workout().unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.streak(), 0);
        assert_eq!(store.stats().total_completed, 0);
        assert_eq!(store.day_status(anchor()), DayStatus::Pending);
    }

    #[test]
    fn test_extra_workout_widens_today_only() {
        let mut store = open_store(anchor());
        assert_eq!(store.workouts_by_date(anchor()).len(), 1);

        store.add_extra_workout("mobility_flow").unwrap();
        assert_eq!(store.workouts_by_date(anchor()).len(), 2);
        // Other dates unaffected
        assert_eq!(store.workouts_by_date(d(2025, 1, 7)).len(), 1);

        // Both sessions can now be logged
        store.complete_workout(None).unwrap();
        store.complete_workout(None).unwrap();
        assert_eq!(store.ledger().records_for_date(anchor()).len(), 2);
        assert!(store.complete_workout(None).is_err());
    }

    #[test]
    fn test_extra_workout_unknown_template_is_error() {
        let mut store = open_store(anchor());
        assert!(store.add_extra_workout("ghost").is_err());
    }

    #[test]
    fn test_skip_after_complete_keeps_streak() {
        let mut store = open_store(anchor());
        store.add_extra_workout("mobility_flow").unwrap();
        store.complete_workout(None).unwrap();
        store
            .skip_workout(SkipReason::NoTime, None)
            .unwrap();

        // The completed session still anchors the streak
        assert_eq!(store.streak(), 1);
        let skipped = store
            .ledger()
            .records_for_date(anchor())
            .into_iter()
            .find(|r| r.status == SessionStatus::Skipped)
            .unwrap();
        assert_eq!(skipped.streak, 1);
    }

    #[test]
    fn test_persisted_roundtrip_preserves_aggregates() {
        let temp_dir = tempfile::tempdir().unwrap();

        let open = |today: NaiveDate| {
            TrainingStore::open(
                default_program(anchor()),
                phase::DEFAULT_TOTAL_WEEKS,
                Box::new(FixedClock::at_date(today)),
                Box::new(crate::kv::FileStore::new(temp_dir.path())),
            )
            .unwrap()
        };

        // Complete Monday and Tuesday
        let mut store = open(anchor());
        store.complete_workout(None).unwrap();
        drop(store);

        let mut store = open(d(2025, 1, 7));
        store.complete_workout(None).unwrap();
        let streak = store.streak();
        let stats = store.stats().clone();
        drop(store);

        // Reload and verify the aggregates re-derive identically
        let reloaded = open(d(2025, 1, 7));
        assert_eq!(reloaded.ledger().len(), 2);
        assert_eq!(reloaded.streak(), streak);
        assert_eq!(reloaded.stats(), &stats);
    }

    #[test]
    fn test_open_with_corrupt_history_starts_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("workout_history.json"),
            "{ not a ledger }",
        )
        .unwrap();

        let store = TrainingStore::open(
            default_program(anchor()),
            16,
            Box::new(FixedClock::at_date(anchor())),
            Box::new(crate::kv::FileStore::new(temp_dir.path())),
        )
        .unwrap();
        assert!(store.ledger().is_empty());
    }

    #[test]
    fn test_phase_accessor() {
        let store = open_store(anchor());
        let info = store.phase().unwrap();
        assert_eq!(info.week_number, 1);
        assert_eq!(info.label, PhaseLabel::Base);
    }

    #[test]
    fn test_grace_streak_across_days() {
        let temp_dir = tempfile::tempdir().unwrap();

        let open = |today: NaiveDate| {
            TrainingStore::open(
                default_program(anchor()),
                phase::DEFAULT_TOTAL_WEEKS,
                Box::new(FixedClock::at_date(today)),
                Box::new(crate::kv::FileStore::new(temp_dir.path())),
            )
            .unwrap()
        };

        let mut store = open(anchor());
        store.complete_workout(None).unwrap();
        drop(store);

        // Tuesday morning, nothing logged yet: grace keeps the streak alive
        let store = open(d(2025, 1, 7));
        assert_eq!(store.streak(), 1);

        // Wednesday: Monday's streak is out of grace range
        let store = open(d(2025, 1, 8));
        assert_eq!(store.streak(), 0);
    }
}
