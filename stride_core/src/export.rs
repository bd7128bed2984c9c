//! CSV export of the session ledger.
//!
//! Flattens session records into an append-safe CSV archive, one row per
//! record, for spreadsheet analysis outside the app.

use crate::ledger::Ledger;
use crate::types::{SessionRecord, SessionStatus, SkipReason};
use crate::Result;
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    recorded_at: String,
    workout_id: String,
    workout_title: String,
    status: String,
    streak: u32,
    effort: Option<u8>,
    tags: String,
    notes: Option<String>,
    skip_reason: Option<String>,
}

impl From<&SessionRecord> for CsvRow {
    fn from(record: &SessionRecord) -> Self {
        let reflection = record.reflection.as_ref();
        CsvRow {
            id: record.id.to_string(),
            date: record.date.to_string(),
            recorded_at: record.recorded_at.to_rfc3339(),
            workout_id: record.workout.id.clone(),
            workout_title: record.workout.title.clone(),
            status: match record.status {
                SessionStatus::Completed => "completed".into(),
                SessionStatus::Skipped => "skipped".into(),
            },
            streak: record.streak,
            effort: reflection.and_then(|r| r.effort),
            tags: reflection
                .map(|r| r.tags.join("|"))
                .unwrap_or_default(),
            notes: reflection.and_then(|r| r.notes.clone()),
            skip_reason: reflection
                .and_then(|r| r.skip_reason.as_ref())
                .map(skip_reason_code),
        }
    }
}

fn skip_reason_code(reason: &SkipReason) -> String {
    match reason {
        SkipReason::NoTime => "no_time".into(),
        SkipReason::Fatigue => "fatigue".into(),
        SkipReason::Injury => "injury".into(),
        SkipReason::Travel => "travel".into(),
        SkipReason::Other(s) => s.clone(),
    }
}

/// Append the ledger to a CSV archive
///
/// Creates the file with headers if needed; appends without duplicating
/// headers otherwise. Returns the number of rows written.
pub fn export_history(ledger: &Ledger, csv_path: &Path) -> Result<usize> {
    if ledger.is_empty() {
        tracing::info!("No sessions to export");
        return Ok(0);
    }

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in ledger.records() {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} session(s) to {:?}", ledger.len(), csv_path);
    Ok(ledger.len())
}
