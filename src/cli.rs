//! CLI interface for trainhero

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use trainhero::plans::{PlanExercise, PlanUpdate, TrainingPlan};
use trainhero::progression::{ProgressionRecord, ProgressionService};
use trainhero::storage::config;
use trainhero::storage::Database;
use trainhero::workouts::{
    is_measurement, CardioSession, Exercise, WeightliftingSession, WorkoutDetails,
};

#[derive(Parser)]
#[command(name = "trainhero")]
#[command(about = "Level up a character by logging real workouts", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: config.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a character for a new user
    Init {
        /// Unique username
        username: String,
    },
    /// Log a weightlifting session
    Lift {
        /// Username
        #[arg(short, long)]
        user: String,
        /// Exercise as NAME:SETS:REPS:WEIGHT, e.g. "Squat:3:8-12:80"
        #[arg(short, long = "exercise", required = true, value_parser = parse_exercise)]
        exercises: Vec<Exercise>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Log a cardio session
    Cardio {
        #[arg(short, long)]
        user: String,
        /// Activity name, e.g. running
        #[arg(short, long, default_value = "running")]
        activity: String,
        /// Duration in minutes
        #[arg(short, long)]
        minutes: u32,
        /// Distance in kilometers
        #[arg(short, long, value_parser = parse_measurement)]
        distance: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show a user's character sheet
    Profile {
        #[arg(short, long)]
        user: String,
    },
    /// Show recent workouts
    History {
        #[arg(short, long)]
        user: String,
        /// Maximum workouts to show (default from config)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show workout totals
    Stats {
        #[arg(short, long)]
        user: String,
    },
    /// List achievements, locked and unlocked
    Achievements {
        #[arg(short, long)]
        user: String,
    },
    /// List quests that have not expired
    Quests {
        #[arg(short, long)]
        user: String,
    },
    /// Replace expired quests with fresh ones
    RefreshQuests {
        #[arg(short, long)]
        user: String,
    },
    /// Show the top characters
    Leaderboard {
        /// Number of entries (default from config)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Manage training plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Create a plan and make it active
    Create {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        name: String,
        /// Exercise as NAME[:SETS[:REPS[:WEIGHT]]]
        #[arg(short, long = "exercise", value_parser = parse_plan_exercise)]
        exercises: Vec<PlanExercise>,
    },
    /// List a user's plans, newest first
    List {
        #[arg(short, long)]
        user: String,
    },
    /// Show the active plan
    Active {
        #[arg(short, long)]
        user: String,
    },
    /// Make a plan the active one
    Activate {
        #[arg(short, long)]
        user: String,
        id: Uuid,
    },
    /// Rename a plan
    Rename {
        #[arg(short, long)]
        user: String,
        id: Uuid,
        name: String,
    },
    /// Delete a plan
    Delete {
        #[arg(short, long)]
        user: String,
        id: Uuid,
    },
}

/// Parse and run the command line.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let app_config = match &cli.config {
        Some(path) => {
            let data_dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(config::get_data_dir);
            config::load_config_from(path, data_dir)?
        }
        None => config::load_config()?,
    };

    if let Commands::Config { write } = cli.command {
        if write {
            let path = cli.config.unwrap_or_else(config::get_config_path);
            config::save_config_to(&path, &app_config)?;
            tracing::info!(path = %path.display(), "Wrote configuration");
        }
        return print_json(&app_config);
    }

    let db_path = cli.db.clone().unwrap_or_else(|| app_config.database_path());
    let catalog = app_config.load_catalog().context("Failed to load catalog")?;
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    tracing::debug!(db = %db_path.display(), "Opened database");

    let mut service = ProgressionService::new(db, Arc::new(catalog), app_config.progression);

    execute(&mut service, cli.command)
}

fn execute(service: &mut ProgressionService, command: Commands) -> Result<()> {
    let now = Utc::now();

    match command {
        Commands::Init { username } => {
            let record = service.initialize_progression(Uuid::new_v4(), &username, now)?;
            print_json(&record)
        }
        Commands::Lift {
            user,
            exercises,
            notes,
        } => {
            let user = lookup(service, &user)?;
            let details = WorkoutDetails::Weightlifting(WeightliftingSession { exercises, notes });
            let outcome = service
                .submit_workout(user.user_id, details, now)?
                .context("User disappeared during submission")?;
            print_json(&outcome)
        }
        Commands::Cardio {
            user,
            activity,
            minutes,
            distance,
            notes,
        } => {
            let user = lookup(service, &user)?;
            let details = WorkoutDetails::Cardio(CardioSession {
                activity,
                duration_minutes: minutes,
                distance_km: distance,
                notes,
            });
            let outcome = service
                .submit_workout(user.user_id, details, now)?
                .context("User disappeared during submission")?;
            print_json(&outcome)
        }
        Commands::Profile { user } => print_json(&lookup(service, &user)?),
        Commands::History { user, limit } => {
            let user = lookup(service, &user)?;
            let limit = limit.unwrap_or(service.settings().history_limit);
            print_json(&service.workout_history(user.user_id, limit)?)
        }
        Commands::Stats { user } => {
            let user = lookup(service, &user)?;
            print_json(&service.workout_stats(user.user_id)?)
        }
        Commands::Achievements { user } => {
            let user = lookup(service, &user)?;
            print_json(&service.achievements(user.user_id)?)
        }
        Commands::Quests { user } => {
            let user = lookup(service, &user)?;
            print_json(&service.active_quests(user.user_id, now)?)
        }
        Commands::RefreshQuests { user } => {
            let user = lookup(service, &user)?;
            let created = service
                .refresh_quests(user.user_id, now)?
                .context("User disappeared during refresh")?;
            print_json(&created)
        }
        Commands::Leaderboard { limit } => {
            let limit = limit.unwrap_or(service.settings().leaderboard_limit);
            print_json(&service.leaderboard(limit)?)
        }
        Commands::Plan { command } => execute_plan(service, command),
        Commands::Config { .. } => bail!("configuration is handled before the database opens"),
    }
}

fn execute_plan(service: &ProgressionService, command: PlanCommands) -> Result<()> {
    let plans = service.plans();

    match command {
        PlanCommands::Create {
            user,
            name,
            exercises,
        } => {
            let user = lookup(service, &user)?;
            let plan = TrainingPlan::new(user.user_id, name, exercises);
            plans.create(&plan)?;
            print_json(&plan)
        }
        PlanCommands::List { user } => {
            let user = lookup(service, &user)?;
            print_json(&plans.list(user.user_id)?)
        }
        PlanCommands::Active { user } => {
            let user = lookup(service, &user)?;
            print_json(&plans.active(user.user_id)?)
        }
        PlanCommands::Activate { user, id } => {
            let user = lookup(service, &user)?;
            let update = PlanUpdate {
                is_active: Some(true),
                ..Default::default()
            };
            print_json(&plans.update(user.user_id, id, &update)?)
        }
        PlanCommands::Rename { user, id, name } => {
            let user = lookup(service, &user)?;
            let update = PlanUpdate {
                name: Some(name),
                ..Default::default()
            };
            print_json(&plans.update(user.user_id, id, &update)?)
        }
        PlanCommands::Delete { user, id } => {
            let user = lookup(service, &user)?;
            plans.delete(user.user_id, id)?;
            println!("Deleted plan {id}");
            Ok(())
        }
    }
}

fn lookup(service: &ProgressionService, username: &str) -> Result<ProgressionRecord> {
    match service.find_user(username)? {
        Some(record) => Ok(record),
        None => bail!("Unknown user '{username}'. Create one with `trainhero init {username}`"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `NAME:SETS:REPS:WEIGHT`.
fn parse_exercise(s: &str) -> Result<Exercise, String> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    let [name, sets, reps, weight] = parts.as_slice() else {
        return Err(format!("expected NAME:SETS:REPS:WEIGHT, got '{s}'"));
    };
    if name.is_empty() {
        return Err("exercise name must not be empty".to_string());
    }

    let sets: u32 = sets
        .parse()
        .map_err(|_| format!("invalid set count '{sets}'"))?;
    let weight = parse_measurement(weight).map_err(|e| format!("weight: {e}"))?;

    Ok(Exercise::new(*name, sets, *reps, weight))
}

/// Parse a finite, non-negative number.
fn parse_measurement(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid number '{s}'"))?;
    if !is_measurement(value) {
        return Err(format!("'{s}' must be a finite, non-negative number"));
    }
    Ok(value)
}

/// Parse `NAME[:SETS[:REPS[:WEIGHT]]]`.
fn parse_plan_exercise(s: &str) -> Result<PlanExercise, String> {
    let mut parts = s.split(':').map(str::trim);

    let name = parts
        .next()
        .filter(|n| !n.is_empty())
        .ok_or("exercise name must not be empty")?;
    let mut exercise = PlanExercise::new(name);

    if let Some(sets) = parts.next() {
        exercise.sets = sets
            .parse()
            .map_err(|_| format!("invalid set count '{sets}'"))?;
    }
    if let Some(reps) = parts.next() {
        exercise.reps = reps.to_string();
    }
    if let Some(weight) = parts.next() {
        let weight = parse_measurement(weight).map_err(|e| format!("weight: {e}"))?;
        exercise.weight = Some(weight);
    }

    Ok(exercise)
}
