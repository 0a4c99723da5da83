use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::{LevelFilter, debug};
use serde::Serialize;
use std::path::{Path, PathBuf};

use fitlog::dates::{local_date, today};
use fitlog::db::models::{NewExercise, SetEntry};
use fitlog::db::DEFAULT_DB_PATH;
use fitlog::session::{HistoryMirror, PlanDefinition, Session};

mod tui;

#[derive(Parser, Debug)]
#[command(version, about = "Fitlog - Workout Tracker CLI", long_about = None)]
struct Args {
    /// SQLite database file
    #[arg(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DB_PATH)]
    db: String,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse logged days and record workouts interactively
    Interactive,
    /// Create missing tables and columns and report what changed
    Schema,
    /// Manage the exercise library
    #[command(subcommand)]
    Exercises(ExerciseCommand),
    /// Insert the built-in exercise library and "Fullbody" plan
    Seed,
    /// Save an exercise's values for a day
    Log {
        #[arg(short, long)]
        exercise: i64,
        /// Defaults to today
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long, default_value = "0")]
        weight: String,
        #[arg(short, long, default_value = "0")]
        reps: String,
        #[arg(short, long, default_value = "0")]
        sets: String,
        #[arg(short, long)]
        notes: Option<String>,
        /// Mark as completed and archive to history
        #[arg(long)]
        done: bool,
    },
    /// Show every exercise with the values to display for a day
    Day {
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Browse and edit archived workouts
    #[command(subcommand)]
    History(HistoryCommand),
    /// Weekly and monthly counts, volume and body stats
    Stats,
    /// Personal records
    Prs {
        /// Heaviest N only
        #[arg(short, long, conflicts_with = "page")]
        top: Option<i64>,
        /// Alphabetical page, starting at 0
        #[arg(short, long)]
        page: Option<i64>,
        #[arg(long, default_value_t = 5)]
        per_page: i64,
    },
    /// Per-day best weight and reps for one exercise
    Progress { exercise: i64 },
    /// Body measurements
    #[command(subcommand)]
    Measure(MeasureCommand),
    /// Workout plans
    #[command(subcommand)]
    Plans(PlanCommand),
    /// Write every table to a JSON backup
    Export {
        /// Defaults to stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Replace all data with a JSON backup
    Import { file: PathBuf },
    /// Delete all data
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ExerciseCommand {
    List,
    Add {
        name: String,
        #[arg(short, long)]
        muscle: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    Delete { id: i64 },
    Notes { id: i64, notes: String },
    Defaults {
        id: i64,
        #[arg(short, long)]
        sets: Option<i64>,
        #[arg(short, long)]
        reps: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    List {
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
        #[arg(short, long, default_value_t = 0)]
        offset: i64,
    },
    Show { date: String },
    Delete { date: String },
    Dates,
}

#[derive(Subcommand, Debug)]
enum MeasureCommand {
    Add {
        /// Tracked kinds: weight, arm, forearm, chest
        kind: String,
        value: f64,
        #[arg(short, long)]
        unit: Option<String>,
        /// `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`; defaults to now
        #[arg(short, long)]
        date: Option<String>,
    },
    List,
    Delete { date: String },
}

#[derive(Subcommand, Debug)]
enum PlanCommand {
    List,
    Show { id: i64 },
    /// Create a plan from a JSON definition file
    Create { file: PathBuf },
    /// Rebuild a plan from a JSON definition file
    Replace { id: i64, file: PathBuf },
    Delete { id: i64 },
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_plan(file: &Path) -> Result<PlanDefinition> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid plan in {}", file.display()))
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

async fn exercises(session: &Session, command: ExerciseCommand, json: bool) -> Result<()> {
    match command {
        ExerciseCommand::List => {
            let exercises = session.all_exercises().await?;
            if json {
                return print_json(&exercises);
            }
            for e in exercises {
                println!(
                    "{}\t{}\t{}\t{}x{}",
                    e.id,
                    e.name,
                    e.muscle_group.unwrap_or_default(),
                    or_dash(e.default_sets),
                    or_dash(e.default_reps)
                );
            }
        }
        ExerciseCommand::Add {
            name,
            muscle,
            notes,
        } => {
            let id = session
                .add_exercise(&NewExercise {
                    name,
                    muscle_group: muscle,
                    notes,
                    ..Default::default()
                })
                .await?;
            println!("{}", id);
        }
        ExerciseCommand::Delete { id } => {
            if !session.delete_exercise(id).await? {
                return Err(anyhow!("No exercise with id {}", id));
            }
        }
        ExerciseCommand::Notes { id, notes } => session.update_exercise_notes(id, &notes).await?,
        ExerciseCommand::Defaults { id, sets, reps } => {
            session.update_exercise_defaults(id, sets, reps).await?
        }
    }
    Ok(())
}

async fn history(session: &Session, command: HistoryCommand, json: bool) -> Result<()> {
    match command {
        HistoryCommand::List { limit, offset } => {
            let days = session.workout_history(limit, offset).await?;
            if json {
                return print_json(&days);
            }
            let total = session.workout_history_count().await?;
            for day in &days {
                println!(
                    "{}\t{} exercises\t{} sets\t{}",
                    day.date,
                    day.exercise_count,
                    day.total_sets,
                    day.exercises.join(", ")
                );
            }
            println!("({} of {} days)", days.len(), total);
        }
        HistoryCommand::Show { date } => {
            let records = session.session_details(&date).await?;
            if json {
                return print_json(&records);
            }
            for record in records {
                println!("{}", record);
            }
            let muscles = session.muscles_trained_on(&date).await?;
            if !muscles.is_empty() {
                println!("Muscles: {}", muscles.join(", "));
            }
        }
        HistoryCommand::Delete { date } => {
            let removed = session.delete_history_by_date(&date).await?;
            println!("Deleted {} records", removed);
        }
        HistoryCommand::Dates => {
            let dates = session.workout_dates().await?;
            if json {
                return print_json(&dates);
            }
            for date in dates {
                println!("{}", date);
            }
        }
    }
    Ok(())
}

async fn measure(session: &Session, command: MeasureCommand, json: bool) -> Result<()> {
    match command {
        MeasureCommand::Add {
            kind,
            value,
            unit,
            date,
        } => {
            let id = session
                .add_measurement(&kind, value, unit.as_deref(), date.as_deref())
                .await?;
            println!("{}", id);
        }
        MeasureCommand::List => {
            let days = session.measurement_history().await?;
            if json {
                return print_json(&days);
            }
            for day in days {
                let values: Vec<String> = day
                    .samples
                    .iter()
                    .map(|m| format!("{}={}{}", m.kind, m.value, m.unit.as_deref().unwrap_or("")))
                    .collect();
                println!("{}\t{}", day.date, values.join(" "));
            }
        }
        MeasureCommand::Delete { date } => {
            let removed = session.delete_measurements_on(&date).await?;
            println!("Deleted {} measurements", removed);
        }
    }
    Ok(())
}

async fn plans(session: &Session, command: PlanCommand, json: bool) -> Result<()> {
    match command {
        PlanCommand::List => {
            let plans = session.list_plans().await?;
            if json {
                return print_json(&plans);
            }
            for plan in plans {
                println!("{}\t{}", plan.id, plan.name);
            }
        }
        PlanCommand::Show { id } => {
            let details = session
                .plan_details(id)
                .await?
                .ok_or_else(|| anyhow!("No plan with id {}", id))?;
            if json {
                return print_json(&details);
            }
            println!("{}", details.plan.name);
            for section in details.sections {
                println!("  {}", section.section.title.unwrap_or_default());
                for entry in section.exercises {
                    println!("    {}\t{}", entry.exercise.id, entry.exercise.name);
                }
            }
        }
        PlanCommand::Create { file } => {
            let id = session.create_plan_from_definition(&read_plan(&file)?).await?;
            println!("{}", id);
        }
        PlanCommand::Replace { id, file } => {
            let new_id = session.replace_plan(id, &read_plan(&file)?).await?;
            println!("{}", new_id);
        }
        PlanCommand::Delete { id } => {
            if !session.delete_plan(id).await? {
                return Err(anyhow!("No plan with id {}", id));
            }
        }
    }
    Ok(())
}

async fn stats(session: &Session, json: bool) -> Result<()> {
    let on = today();
    let weekly = session.weekly_workout_count(on).await?;
    let monthly = session.monthly_workout_count(on).await?;
    let volume = session.volume_last_7().await?;
    let body = session.body_stat_series().await?;
    let latest = session.latest_body_stats().await?;

    if json {
        return print_json(&serde_json::json!({
            "weekly": weekly,
            "monthly": monthly,
            "volume": volume,
            "body": body,
            "latest": latest,
        }));
    }

    println!("This week: {} workouts, this month: {}", weekly, monthly);
    println!("Volume:");
    for point in volume {
        println!("  {}\t{:.0}", point.label, point.volume);
    }
    println!("Body:");
    for stat in latest {
        println!("  {}\t{}\t({})", stat.kind, stat.value, stat.date);
    }
    if !body.dates.is_empty() {
        println!("Last {} measured days: {}", body.dates.len(), body.labels.join(" "));
        for line in body.lines {
            let values: Vec<String> = line.values.into_iter().map(or_dash).collect();
            println!("  {}\t{}", line.kind, values.join(" "));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    debug!("Using database {}", args.db);
    let session = Session::new(&args.db).await?;
    let json = args.json;

    match args.command {
        Commands::Interactive => tui::run(&session).await?,
        Commands::Schema => {
            let report = session.ensure_schema().await?;
            for name in &report.applied {
                println!("applied\t{}", name);
            }
            for name in &report.skipped {
                println!("present\t{}", name);
            }
            for (name, error) in &report.failed {
                println!("failed\t{}\t{}", name, error);
            }
            if !report.is_clean() {
                return Err(anyhow!("{} migrations failed", report.failed.len()));
            }
        }
        Commands::Exercises(command) => exercises(&session, command, json).await?,
        Commands::Seed => {
            let plan_id = session.seed_fullbody_plan().await?;
            println!("Seeded plan {}", plan_id);
        }
        Commands::Log {
            exercise,
            date,
            weight,
            reps,
            sets,
            notes,
            done,
        } => {
            let date = date.unwrap_or_else(local_date);
            let link_id = session.ensure_link(exercise, &date).await?;
            let entry = SetEntry::from_text(&weight, &reps, &sets, notes, done);
            let outcome = session.save_set(link_id, &entry).await?;
            match outcome.history {
                HistoryMirror::Skipped => println!("Saved draft {}", link_id),
                HistoryMirror::Archived { history_id } => {
                    println!("Saved {} and archived as {}", link_id, history_id)
                }
                HistoryMirror::Failed(e) => {
                    println!("Saved {} but not archived: {}", link_id, e)
                }
            }
        }
        Commands::Day { date } => {
            let date = date.unwrap_or_else(local_date);
            let drafts = session.drafts_for_day(&date).await?;
            if json {
                return print_json(&drafts);
            }
            for card in drafts {
                let done = card.link.as_ref().is_some_and(|l| l.is_completed);
                println!(
                    "{}\t{}\t{}kg x {} x {}\t{}{}",
                    card.exercise.id,
                    card.exercise.name,
                    or_dash(card.draft.weight),
                    or_dash(card.draft.reps),
                    or_dash(card.draft.sets),
                    card.draft.notes,
                    if done { "\t[done]" } else { "" }
                );
            }
        }
        Commands::History(command) => history(&session, command, json).await?,
        Commands::Stats => stats(&session, json).await?,
        Commands::Prs {
            top,
            page,
            per_page,
        } => {
            let records = match (top, page) {
                (Some(n), _) => session.top_personal_records(n).await?,
                (None, Some(p)) => session.personal_records_page(per_page, p * per_page).await?,
                (None, None) => session.personal_records().await?,
            };
            if json {
                return print_json(&records);
            }
            for record in &records {
                println!("{}\t{}", record.exercise_name, record.max_weight);
            }
            if page.is_some() {
                println!("({} exercises)", session.personal_record_count().await?);
            }
        }
        Commands::Progress { exercise } => {
            let points = session.exercise_progress(exercise).await?;
            if json {
                return print_json(&points);
            }
            for p in points {
                println!(
                    "{}\t{}kg\t{} reps\t{} sets",
                    p.workout_date,
                    or_dash(p.weight),
                    or_dash(p.reps),
                    p.sets
                );
            }
        }
        Commands::Measure(command) => measure(&session, command, json).await?,
        Commands::Plans(command) => plans(&session, command, json).await?,
        Commands::Export { out } => match out {
            Some(path) => session.export_to_file(&path).await?,
            None => println!("{}", session.export_json().await?),
        },
        Commands::Import { file } => {
            let summary = session.import_from_file(&file).await?;
            if json {
                return print_json(&summary);
            }
            for (table, rows) in &summary.rows {
                println!("{}\t{}", table, rows);
            }
            for column in &summary.skipped_columns {
                println!("skipped column {}", column);
            }
        }
        Commands::Reset { yes } => {
            if !yes {
                return Err(anyhow!("Refusing to delete all data without --yes"));
            }
            session.reset_all().await?;
            println!("All data deleted");
        }
    }

    Ok(())
}
