#![forbid(unsafe_code)]

//! Core domain model and business logic for the Stride training companion.
//!
//! This crate provides:
//! - Domain types (workout templates, programs, session records)
//! - Schedule resolution against a repeating multi-week program
//! - Phase classification of elapsed program time
//! - Session ledger with reflection merging
//! - Streak and stats aggregation
//! - Persistence (key-value snapshots, plan import, CSV export)

pub mod types;
pub mod error;
pub mod calendar;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod phase;
pub mod ledger;
pub mod stats;
pub mod kv;
pub mod store;
pub mod program;
pub mod plan;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use calendar::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use ledger::Ledger;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use store::TrainingStore;
pub use program::{build_default_templates, default_program};
pub use plan::import_plan;
pub use schedule::{resolve, resolve_with_extras};
pub use phase::classify;
pub use stats::{compute_stats, compute_streak};
pub use export::export_history;
