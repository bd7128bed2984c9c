//! Error types for the stride_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for stride_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Program validation error
    #[error("Program validation error: {0}")]
    ProgramValidation(String),

    /// External plan rejected by validation
    #[error("Plan validation error: {0}")]
    PlanValidation(String),

    /// No ledger entry exists for the requested date
    #[error("no session recorded for {0}")]
    NoSessionForDate(NaiveDate),

    /// Multiple ledger entries match the date and no workout hint was given
    #[error("multiple sessions recorded for {0}; a workout hint is required")]
    AmbiguousReflectionTarget(NaiveDate),

    /// Nothing is scheduled for the date, so there is nothing to log against
    #[error("no workout scheduled for {0}")]
    NoWorkoutScheduled(NaiveDate),

    /// Store management error
    #[error("Store error: {0}")]
    Store(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
