//! The session ledger: an ordered collection of session records.
//!
//! Ordering (newest first by `recorded_at`) is re-established on every
//! mutation, so it holds even when records arrive out of chronological
//! order. All queries are linear scans; the ledger stays small enough
//! (years of daily use is a few thousand records) that no index is
//! worth carrying.

use crate::error::{Error, Result};
use crate::types::{ReflectionData, SessionRecord};
use chrono::NaiveDate;
use uuid::Uuid;

/// Ordered collection of session records, newest first
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    records: Vec<SessionRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from loaded records, restoring the ordering invariant
    pub fn from_records(records: Vec<SessionRecord>) -> Self {
        let mut ledger = Self { records };
        ledger.sort_newest_first();
        ledger
    }

    /// Records in newest-first order
    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a new record
    pub fn append(&mut self, record: SessionRecord) {
        tracing::debug!(
            "Appending {:?} session {} for {}",
            record.status,
            record.id,
            record.date
        );
        self.records.push(record);
        self.sort_newest_first();
    }

    /// Attach reflection metadata to the record for a date
    ///
    /// Target selection: among records matching the date (day
    /// granularity), the one whose snapshotted workout matches
    /// `workout_hint` if a hint is given; without a hint the match must
    /// be unique. Ambiguous merges and missing targets are errors, not
    /// guesses or silent no-ops. Repeated merges against the same target
    /// overwrite the reflection wholesale.
    pub fn merge_reflection(
        &mut self,
        date: NaiveDate,
        reflection: ReflectionData,
        workout_hint: Option<&str>,
    ) -> Result<Uuid> {
        let mut matches = self
            .records
            .iter_mut()
            .filter(|r| r.date == date)
            .peekable();

        if matches.peek().is_none() {
            return Err(Error::NoSessionForDate(date));
        }

        let target = match workout_hint {
            Some(hint) => matches
                .find(|r| r.workout.id == hint)
                .ok_or(Error::NoSessionForDate(date))?,
            None => {
                let mut matches: Vec<_> = matches.collect();
                if matches.len() > 1 {
                    return Err(Error::AmbiguousReflectionTarget(date));
                }
                matches.remove(0)
            }
        };

        tracing::debug!("Merging reflection into session {}", target.id);
        target.reflection = Some(reflection);
        Ok(target.id)
    }

    /// Delete all records for a day, returning how many were removed
    pub fn remove_for_date(&mut self, date: NaiveDate) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.date != date);
        let removed = before - self.records.len();
        if removed > 0 {
            tracing::debug!("Removed {} record(s) for {}", removed, date);
        }
        removed
    }

    /// All records for a day, in ledger order
    pub fn records_for_date(&self, date: NaiveDate) -> Vec<&SessionRecord> {
        self.records.iter().filter(|r| r.date == date).collect()
    }

    /// Most recently recorded entry for a day
    pub fn latest_for_date(&self, date: NaiveDate) -> Option<&SessionRecord> {
        self.records.iter().find(|r| r.date == date)
    }

    fn sort_newest_first(&mut self) {
        self.records
            .sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    }
}
