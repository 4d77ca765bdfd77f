//! `modiary` command-line host.
//!
//! # Responsibility
//! - Resolve config, start logging and open the single `StateStore`.
//! - Map subcommands onto store operations and read-only analytics.
//! - Print human-readable results; errors go to stderr with exit code 1.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use modiary_core::db::open_db;
use modiary_core::{
    daily_completion_ratio, init_logging, monthly_diaries, monthly_routine_stats,
    monthly_summary, reflect_or_fallback, routines_for_date, search, BackupImport, CoreConfig,
    DisabledReflectionService, GeminiReflectionService, ImportMode, MoveDirection, NewSchedule,
    ReflectionService, ReflectionTracker, RoutineId, ScheduleId, SearchKind, SearchQuery,
    SqliteStateRepository, StateRepository, StateStore,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "modiary",
    version,
    about = "MoDiary: routines, schedules and a daily diary",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check core linkage and print the core version.
    Ping,
    /// Write the whole state to a backup JSON file.
    Export {
        /// Target directory; the file name is derived from today's date.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Import a backup JSON file.
    Import {
        file: PathBuf,
        #[arg(long, default_value = "merge")]
        mode: ImportMode,
    },
    /// Import events from an iCalendar file as schedules.
    ImportIcs { file: PathBuf },
    /// Manage routine templates.
    Routine {
        #[command(subcommand)]
        action: RoutineAction,
    },
    /// Toggle completion of a routine on a date.
    Check {
        id: RoutineId,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Manage schedules.
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Show or replace the diary entry of a date.
    Diary {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// New content; prints the current entry when omitted.
        #[arg(long)]
        text: Option<String>,
    },
    /// Show the routines and completion ratio of a date.
    Progress {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show monthly routine statistics and diary entries.
    Stats {
        /// Any date inside the month to report.
        #[arg(long)]
        month: Option<NaiveDate>,
    },
    /// Search diary content and schedule text.
    Search {
        query: String,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Ask for a one-sentence reflection on a diary entry.
    Reflect {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
enum RoutineAction {
    /// List all routines, archived ones included.
    List,
    /// Add a routine recurring on the given weekdays (0 = Sunday .. 6 = Saturday).
    Add {
        text: String,
        #[arg(long, value_delimiter = ',', required = true)]
        days: Vec<u8>,
    },
    /// Delete a routine and its completion history.
    Delete { id: RoutineId },
    /// Hide a routine from future days, keeping its history.
    Archive { id: RoutineId },
    Restore { id: RoutineId },
    Up { id: RoutineId },
    Down { id: RoutineId },
}

#[derive(Subcommand, Debug)]
enum ScheduleAction {
    Add {
        text: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// `HH:MM`; omit for an all-day event.
        #[arg(long, default_value = "")]
        time: String,
        /// One of the palette classes, e.g. `bg-rose-500`.
        #[arg(long)]
        color: Option<String>,
    },
    Remove { id: ScheduleId },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Diary,
    Schedule,
}

impl From<KindArg> for SearchKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Diary => SearchKind::Diary,
            KindArg::Schedule => SearchKind::Schedule,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Ping = cli.command {
        println!("modiary_core ping={}", modiary_core::ping());
        println!("modiary_core version={}", modiary_core::core_version());
        return Ok(());
    }

    let config = CoreConfig::from_env().context("failed to resolve configuration")?;
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let mut store = StateStore::open(SqliteStateRepository::new(&conn))?;
    info!("event=cli_command module=cli status=start");

    let today = Local::now().date_naive();
    match cli.command {
        Commands::Ping => {}
        Commands::Export { dir } => {
            let export = store.export_backup(today)?;
            let path = dir.join(&export.file_name);
            fs::write(&path, export.document)
                .with_context(|| format!("failed to write `{}`", path.display()))?;
            println!("exported {}", path.display());
        }
        Commands::Import { file, mode } => {
            let document = read_text(&file)?;
            match store.import_backup(&document, mode)? {
                BackupImport::Merged(summary) => println!(
                    "merged: routines +{} ~{}, checks +{} completed {}, schedules +{} ~{}, diaries +{} combined {}",
                    summary.routines_added,
                    summary.routines_replaced,
                    summary.checks_added,
                    summary.checks_completed,
                    summary.schedules_added,
                    summary.schedules_replaced,
                    summary.diaries_added,
                    summary.diaries_combined
                ),
                BackupImport::Replaced => println!("replaced current data with backup"),
            }
        }
        Commands::ImportIcs { file } => {
            let text = read_text(&file)?;
            let outcome = store.import_calendar(&text)?;
            println!(
                "imported {} events ({} duplicates skipped)",
                outcome.added, outcome.duplicates
            );
        }
        Commands::Routine { action } => run_routine(&mut store, action)?,
        Commands::Check { id, date } => {
            let date = date.unwrap_or(today);
            let completed = store.toggle_check(date, id)?;
            println!("{date} {id} {}", if completed { "done" } else { "open" });
        }
        Commands::Schedule { action } => run_schedule(&mut store, action, today)?,
        Commands::Diary { date, text } => {
            let date = date.unwrap_or(today);
            match text {
                Some(text) => {
                    store.update_diary(date, &text)?;
                    println!("saved diary for {date}");
                }
                None => match store.state().diary(date) {
                    Some(entry) => println!("{}", entry.content),
                    None => println!("no diary entry for {date}"),
                },
            }
        }
        Commands::Progress { date } => {
            let date = date.unwrap_or(today);
            let state = store.state();
            println!("{date}: {}%", daily_completion_ratio(state, date));
            for routine in routines_for_date(state, date) {
                let mark = if state.is_completed(date, routine.id) {
                    "x"
                } else {
                    " "
                };
                println!("[{mark}] {} {}", routine.id, routine.text);
            }
        }
        Commands::Stats { month } => {
            let month = month.unwrap_or(today);
            let state = store.state();
            let stats = monthly_routine_stats(state, month);
            let summary = monthly_summary(&stats);
            println!("{}", month.format("%Y-%m"));
            println!(
                "completed {} | average {}%",
                summary.total_completed, summary.average_percent
            );
            if let Some(best) = &summary.best_routine {
                println!("best: {} ({}%)", best.text, best.percent);
            }
            for stat in &stats {
                println!(
                    "{:>3}% {:>2}/{:<2} {}",
                    stat.percent, stat.completed, stat.scheduled, stat.text
                );
            }
            for entry in monthly_diaries(state, month) {
                println!("{} {}", entry.date, first_line(&entry.content));
            }
        }
        Commands::Search { query, kind, limit } => {
            let query = SearchQuery {
                kind: kind.map(SearchKind::from),
                limit,
                ..SearchQuery::new(query)
            };
            for hit in search(store.state(), &query) {
                println!(
                    "{} {:<8} {}",
                    hit.date,
                    hit.kind.as_str(),
                    first_line(&hit.text)
                );
            }
        }
        Commands::Reflect { date } => {
            let date = date.unwrap_or(today);
            let diary = store
                .state()
                .diary(date)
                .map(|entry| entry.content.clone())
                .unwrap_or_default();
            println!("{}", reflect(&config, diary)?);
        }
    }
    Ok(())
}

fn run_routine<R: StateRepository>(
    store: &mut StateStore<R>,
    action: RoutineAction,
) -> Result<()> {
    match action {
        RoutineAction::List => {
            let mut routines: Vec<_> = store.state().routines.iter().collect();
            routines.sort_by_key(|routine| routine.order);
            for routine in routines {
                let days = routine
                    .recurrence_days
                    .iter()
                    .map(u8::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                let status = if routine.is_active { "" } else { " (archived)" };
                println!("{} [{days}] {}{status}", routine.id, routine.text);
            }
        }
        RoutineAction::Add { text, days } => {
            let id = store.add_routine(&text, days)?;
            println!("{id}");
        }
        RoutineAction::Delete { id } => store.delete_routine(id)?,
        RoutineAction::Archive { id } => store.set_routine_active(id, false)?,
        RoutineAction::Restore { id } => store.set_routine_active(id, true)?,
        RoutineAction::Up { id } => store.move_routine(id, MoveDirection::Up)?,
        RoutineAction::Down { id } => store.move_routine(id, MoveDirection::Down)?,
    }
    Ok(())
}

fn run_schedule<R: StateRepository>(
    store: &mut StateStore<R>,
    action: ScheduleAction,
    today: NaiveDate,
) -> Result<()> {
    match action {
        ScheduleAction::Add {
            text,
            date,
            time,
            color,
        } => {
            let id = store.add_schedule(NewSchedule {
                date: date.unwrap_or(today),
                time,
                text,
                color,
            })?;
            println!("{id}");
        }
        ScheduleAction::Remove { id } => store.remove_schedule(id)?,
    }
    Ok(())
}

/// Runs the reflection request on a worker thread and applies it through the
/// tracker.
fn reflect(config: &CoreConfig, diary: String) -> Result<String> {
    let service: Box<dyn ReflectionService + Send> =
        match GeminiReflectionService::from_config(&config.reflection) {
            Some(service) => Box::new(service),
            None => {
                warn!("event=reflection module=cli status=disabled reason=missing_api_key");
                Box::new(DisabledReflectionService)
            }
        };

    let mut tracker = ReflectionTracker::new();
    let ticket = tracker.issue();
    let worker = std::thread::spawn(move || reflect_or_fallback(service.as_ref(), &diary));
    let Ok(message) = worker.join() else {
        bail!("reflection worker panicked");
    };
    tracker.complete(ticket, message);
    Ok(tracker.message().unwrap_or_default().to_string())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
