use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use liftlog_core::sets::SetField;
use liftlog_core::types::session_date;
use liftlog_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Strength training session logger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active program and overall progress (default)
    Active,

    /// Show the pre-filled session for a program day
    Plan {
        /// Program day name
        #[arg(long)]
        day: String,
    },

    /// Log a session for a program day
    Log {
        /// Program day name
        #[arg(long)]
        day: String,

        /// Session date (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Weight of an exercise's first set as EXERCISE=WEIGHT (1-based);
        /// carried into the following sets that have no weight yet
        #[arg(long = "weight", value_parser = parse_weight)]
        weights: Vec<(usize, f64)>,

        /// Mark every set completed
        #[arg(long)]
        complete_all: bool,

        /// Dry run - show the session without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Export all logged sets of the active program to CSV
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    liftlog_core::logging::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }

    tracing::debug!(
        "Using backend {} with data in {:?}",
        config.api.base_url,
        config.data.data_dir
    );
    let mut backend = HttpBackend::from_config(&config.api);

    match cli.command {
        Some(Commands::Active) | None => cmd_active(&mut backend),
        Some(Commands::Plan { day }) => cmd_plan(&mut backend, &config, &day),
        Some(Commands::Log {
            day,
            date,
            weights,
            complete_all,
            dry_run,
        }) => cmd_log(
            &mut backend,
            &config,
            &day,
            date,
            &weights,
            complete_all,
            dry_run,
        ),
        Some(Commands::Export { out }) => cmd_export(&mut backend, &out),
    }
}

fn active_history(backend: &mut dyn SessionBackend) -> Result<ProgramHistory> {
    backend
        .get_active_program()?
        .ok_or_else(|| Error::Other("No active program".into()))
}

fn cmd_active(backend: &mut dyn SessionBackend) -> Result<()> {
    let Some(history) = backend.get_active_program()? else {
        println!("No active program.");
        return Ok(());
    };

    let program = &history.program;
    let problems = program.validate();
    if !problems.is_empty() {
        eprintln!("Program validation warnings:");
        for problem in problems {
            eprintln!("  - {}", problem);
        }
    }

    let summary = ProgramProgressSummary::from_history(&history);
    println!("\n{}", program.name);
    if let Some(description) = &program.description {
        println!("  {}", description);
    }
    println!(
        "  {} days/week, {} sessions logged",
        program.days_per_week, summary.sessions_logged
    );
    println!(
        "  Progress: {}/{} sets ({}%)",
        summary.completed_sets, summary.expected_sets, summary.progress_percent
    );
    println!();

    for day in &program.days {
        let last = prefill::latest_log_for_day(&history.progress.day_logs, &day.name);
        match last {
            Some(log) => println!("  • {} (last: {})", day.name, log.date),
            None => println!("  • {}", day.name),
        }
    }
    println!();

    Ok(())
}

fn cmd_plan(backend: &mut dyn SessionBackend, config: &Config, day: &str) -> Result<()> {
    let history = active_history(backend)?;
    let mut editor = SessionEditor::new(history, Local::now().date_naive())
        .with_defaults(config.session.prefill_defaults());
    editor.select_day(day)?;

    display_session(&editor);
    Ok(())
}

fn cmd_log(
    backend: &mut dyn SessionBackend,
    config: &Config,
    day: &str,
    date: Option<NaiveDate>,
    weights: &[(usize, f64)],
    complete_all: bool,
    dry_run: bool,
) -> Result<()> {
    let history = active_history(backend)?;
    let drafts = DraftStore::new(config.drafts_dir(), config.session.draft_max_age_hours);
    let today = Local::now().date_naive();
    let mut editor = SessionEditor::new(history, date.unwrap_or(today))
        .with_defaults(config.session.prefill_defaults());
    if !dry_run {
        editor = editor.with_drafts(drafts);
    }
    editor.select_day(day)?;

    // A recovered draft keeps its own date unless one was given
    if let Some(date) = date {
        editor.set_session_date(date);
    }
    for &(exercise, weight) in weights {
        let index = exercise
            .checked_sub(1)
            .ok_or_else(|| Error::Validation("Exercise numbers start at 1".into()))?;
        editor.update_set(index, 0, SetField::Weight(weight))?;
    }
    if complete_all {
        editor.complete_all();
    }

    display_session(&editor);

    if dry_run {
        println!("\n[Dry run - not logging session]");
        return Ok(());
    }

    let history = editor.commit(backend)?;
    let summary = ProgramProgressSummary::from_history(&history);

    println!("\n✓ Session logged!");
    if let Some(id) = editor.server_session_id() {
        println!("  Session: {}", id);
    }
    println!(
        "  Program progress: {}/{} sets ({}%)",
        summary.completed_sets, summary.expected_sets, summary.progress_percent
    );

    Ok(())
}

fn cmd_export(backend: &mut dyn SessionBackend, out: &Path) -> Result<()> {
    let history = active_history(backend)?;
    let rows = export_day_logs(&history, out)?;

    println!("✓ Exported {} sets to CSV", rows);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn display_session(editor: &SessionEditor) {
    let program = &editor.history().program;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", editor.selected_day());
    println!("╰─────────────────────────────────────────╯");
    println!("  Date: {}", editor.session_date());
    println!();

    for (number, progress) in editor.exercises().iter().enumerate() {
        let name = program
            .find_exercise(progress)
            .map(|ex| ex.name.as_str())
            .unwrap_or(progress.exercise_id.as_str());
        println!("  {}. {}", number + 1, name);

        for (index, set) in progress.sets.iter().enumerate() {
            let mark = if set.completed { "✓" } else { " " };
            println!(
                "     [{}] Set {}: {} reps @ {}",
                mark,
                index + 1,
                set.reps,
                set.weight
            );
            for drop in &set.drops {
                println!("          ↓ {} reps @ {}", drop.reps, drop.weight);
            }
        }
        if let Some(notes) = &progress.notes {
            println!("     Notes: {}", notes);
        }
    }

    let progress = editor.progress();
    println!();
    println!(
        "  Sets: {}/{} ({}%)",
        progress.completed_sets, progress.total_sets, progress.progress_percent
    );
    println!("  Volume: {}", editor.volume());
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    session_date::parse(raw).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_weight(raw: &str) -> std::result::Result<(usize, f64), String> {
    let (exercise, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected EXERCISE=WEIGHT, got '{}'", raw))?;
    let exercise = exercise
        .trim()
        .parse()
        .map_err(|_| format!("invalid exercise number '{}'", exercise))?;
    let weight = match weight.trim().parse::<f64>() {
        Ok(w) if w.is_finite() && w >= 0.0 => w,
        _ => return Err(format!("invalid weight '{}', expected a number >= 0", weight)),
    };
    Ok((exercise, weight))
}
