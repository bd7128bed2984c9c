use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use stride_core::*;

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Training schedule and session ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pin "today" to a fixed date (for testing and demos)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's schedule, status and streak (default)
    Today,

    /// Show the schedule and status for a date
    Show {
        /// Date to inspect (YYYY-MM-DD)
        date: NaiveDate,
    },

    /// Log today's workout as completed
    Done {
        /// Per-exercise completion, e.g. --progress pushup=ttf
        #[arg(long)]
        progress: Vec<String>,
    },

    /// Log today's workout as skipped
    Skip {
        /// Reason code (no_time, fatigue, injury, travel, or free text)
        #[arg(long)]
        reason: String,

        /// Optional note
        #[arg(long)]
        notes: Option<String>,
    },

    /// Attach reflection metadata to today's session
    Reflect {
        /// Effort rating 1-10
        #[arg(long)]
        effort: Option<u8>,

        /// Short tag (repeatable, at most 3)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,

        /// Workout id to target on multi-workout days
        #[arg(long)]
        workout: Option<String>,
    },

    /// Remove today's logged session(s)
    Reset,

    /// Show streak and completion stats
    Stats,

    /// Register a bonus workout for today
    Extra {
        /// Template id to add
        template_id: String,
    },

    /// Import a generated plan file, replacing the current program
    Import {
        /// Path to the plan JSON
        path: PathBuf,
    },

    /// Export session history to CSV
    Export {
        /// Output CSV path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    stride_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let clock: Box<dyn Clock> = match cli.today {
        Some(date) => Box::new(FixedClock::at_date(date)),
        None => Box::new(SystemClock),
    };
    let today = clock.today();

    let program_path = data_dir.join("program.json");
    let program = match config.program.anchor {
        Some(anchor) if !program_path.exists() => {
            let program = default_program(anchor);
            program.save(&program_path)?;
            program
        }
        _ => stride_core::Program::load_or_init(&program_path, today)?,
    };

    let store = TrainingStore::open(
        program,
        config.phase.total_weeks,
        clock,
        Box::new(FileStore::new(&data_dir)),
    )?;

    match cli.command {
        Some(Commands::Today) | None => cmd_today(&store),
        Some(Commands::Show { date }) => cmd_show(&store, date),
        Some(Commands::Done { progress }) => cmd_done(store, &progress),
        Some(Commands::Skip { reason, notes }) => cmd_skip(store, &reason, notes),
        Some(Commands::Reflect {
            effort,
            tags,
            notes,
            workout,
        }) => cmd_reflect(store, effort, tags, notes, workout),
        Some(Commands::Reset) => cmd_reset(store),
        Some(Commands::Stats) => cmd_stats(&store),
        Some(Commands::Extra { template_id }) => cmd_extra(store, &template_id),
        Some(Commands::Import { path }) => cmd_import(store, &data_dir, &path),
        Some(Commands::Export { path }) => cmd_export(&store, &path),
    }
}

fn cmd_today(store: &TrainingStore) -> Result<()> {
    let today = store.today();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  TODAY · {}", today);
    println!("╰─────────────────────────────────────────╯");

    if let Some(phase) = store.phase() {
        println!(
            "  Week {} · {:?} phase · {}% through the plan",
            phase.week_number, phase.label, phase.progress_percent
        );
    }
    println!("  Streak: {} day(s)", store.streak());
    println!();

    display_day(store, today);
    Ok(())
}

fn cmd_show(store: &TrainingStore, date: NaiveDate) -> Result<()> {
    println!("\n  {} · {:?}", date, store.day_status(date));
    println!();
    display_day(store, date);
    Ok(())
}

fn cmd_done(mut store: TrainingStore, progress: &[String]) -> Result<()> {
    let exercise_progress = parse_progress(progress)?;
    store.complete_workout(exercise_progress)?;

    println!("✓ Workout logged!");
    println!("  Streak: {} day(s)", store.streak());
    Ok(())
}

fn cmd_skip(mut store: TrainingStore, reason: &str, notes: Option<String>) -> Result<()> {
    let reflection = notes.map(|n| ReflectionData {
        notes: Some(n),
        ..Default::default()
    });
    store.skip_workout(SkipReason::parse(reason), reflection)?;

    println!("✓ Workout skipped.");
    println!("  Streak: {} day(s)", store.streak());
    Ok(())
}

fn cmd_reflect(
    mut store: TrainingStore,
    effort: Option<u8>,
    tags: Vec<String>,
    notes: Option<String>,
    workout: Option<String>,
) -> Result<()> {
    if let Some(e) = effort {
        if !(1..=10).contains(&e) {
            return Err(Error::Other(format!("effort must be 1-10, got {}", e)));
        }
    }
    if tags.len() > 3 {
        return Err(Error::Other(format!(
            "at most 3 tags allowed, got {}",
            tags.len()
        )));
    }

    let reflection = ReflectionData {
        effort,
        tags,
        notes,
        skip_reason: None,
    };
    store.set_reflection(reflection, workout.as_deref())?;

    println!("✓ Reflection saved.");
    Ok(())
}

fn cmd_reset(mut store: TrainingStore) -> Result<()> {
    let removed = store.reset_workout()?;
    if removed == 0 {
        println!("Nothing logged today - nothing to reset.");
    } else {
        println!("✓ Removed {} session(s) for today.", removed);
    }
    Ok(())
}

fn cmd_stats(store: &TrainingStore) -> Result<()> {
    let stats = store.stats();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  STATS");
    println!("╰─────────────────────────────────────────╯");
    println!("  Streak:          {} day(s)", store.streak());
    println!("  This month:      {} completed", stats.this_month_completed);
    println!("  All time:        {} completed", stats.total_completed);
    println!("  Completion rate: {}%", stats.completion_rate);
    println!();
    Ok(())
}

fn cmd_extra(mut store: TrainingStore, template_id: &str) -> Result<()> {
    store.add_extra_workout(template_id)?;
    println!("✓ Added extra workout for today: {}", template_id);
    display_day(&store, store.today());
    Ok(())
}

fn cmd_import(store: TrainingStore, data_dir: &std::path::Path, path: &std::path::Path) -> Result<()> {
    // New plans keep the current anchor so elapsed-time framing survives
    let anchor = store.program().anchor;

    match stride_core::import_plan(path, anchor) {
        Ok(program) => {
            program.save(&data_dir.join("program.json"))?;
            println!("✓ Imported plan '{}' ({} weeks).", program.name, program.cycle_weeks());
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Plan import rejected: {}", e);
            println!("Plan rejected ({}).", e);
            println!("Keeping the current program: {}", store.program().name);
            Ok(())
        }
    }
}

fn cmd_export(store: &TrainingStore, path: &std::path::Path) -> Result<()> {
    let count = stride_core::export_history(store.ledger(), path)?;
    if count == 0 {
        println!("No sessions to export.");
    } else {
        println!("✓ Exported {} session(s) to CSV", count);
        println!("  CSV: {}", path.display());
    }
    Ok(())
}

fn display_day(store: &TrainingStore, date: NaiveDate) {
    let workouts = store.workouts_by_date(date);
    if workouts.is_empty() {
        match store.day_status(date) {
            DayStatus::NotStarted => println!("  Program hasn't started yet."),
            _ => println!("  Rest day - nothing scheduled."),
        }
        return;
    }

    for workout in workouts {
        println!("  {} ({})", workout.title, workout.subtitle);
        println!("  ~{} min", workout.estimated_minutes);
        for exercise in &workout.exercises {
            println!("    → {} · {}", exercise.name, exercise.info);
        }
        println!();
    }
}

/// Parse repeated `--progress exercise_id=tft` flags
fn parse_progress(entries: &[String]) -> Result<Option<HashMap<String, Vec<bool>>>> {
    if entries.is_empty() {
        return Ok(None);
    }

    let mut progress = HashMap::new();
    for entry in entries {
        let (id, flags) = entry.split_once('=').ok_or_else(|| {
            Error::Other(format!("invalid progress '{}', expected id=tft", entry))
        })?;

        let sets = flags
            .chars()
            .map(|c| match c.to_ascii_lowercase() {
                't' => Ok(true),
                'f' => Ok(false),
                other => Err(Error::Other(format!(
                    "invalid progress flag '{}' in '{}'",
                    other, entry
                ))),
            })
            .collect::<Result<Vec<bool>>>()?;

        progress.insert(id.to_string(), sets);
    }

    Ok(Some(progress))
}
