mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{
    cmd_badges, cmd_calendar, cmd_day, cmd_export, cmd_goal_add, cmd_goal_delete, cmd_goal_update,
    cmd_goals, cmd_history, cmd_log, cmd_meals, cmd_measure, cmd_measurements, cmd_progress,
    cmd_record_add, cmd_records, cmd_reset, cmd_session, cmd_set, cmd_streak, cmd_toggle_exercise,
    cmd_toggle_meal, cmd_weight, cmd_workouts,
};
use crate::config::Config;
use lift_core::models::{
    NewExerciseSet, NewGoal, NewMeasurement, NewPersonalRecord, NewWorkoutSession, UpdateGoal,
};
use lift_core::service::LiftService;

#[derive(Parser)]
#[command(
    name = "lift",
    version,
    about = "A local-first workout, diet and progress tracker",
    long_about = "\n\n  ██╗     ██╗███████╗████████╗
  ██║     ██║██╔════╝╚══██╔══╝
  ██║     ██║█████╗     ██║
  ██║     ██║██╔══╝     ██║
  ███████╗██║██║        ██║
  ╚══════╝╚═╝╚═╝        ╚═╝
     show up. tick it off.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the plan and completion state for a day (defaults to today)
    Day {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark an exercise or meal as done (or not done)
    Toggle {
        #[command(subcommand)]
        command: ToggleCommands,
    },
    /// Show the current run of consecutive active days
    Streak {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show logged days over a recent window
    Progress {
        /// Number of days to look back
        #[arg(short, long)]
        days: Option<i64>,
        /// Show aggregate totals instead of one row per day
        #[arg(long)]
        summary: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record weight, water and notes for a day (shows the log if no fields given)
    Log {
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Body weight
        #[arg(short, long, conflicts_with = "clear_weight")]
        weight: Option<f64>,
        /// Remove the recorded weight
        #[arg(long)]
        clear_weight: bool,
        /// Glasses of water
        #[arg(long)]
        water: Option<i64>,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the weekly workout plan, or one day's exercises
    Workouts {
        /// Day of week: 0 (Sunday) through 6 (Saturday)
        #[arg(short, long)]
        day: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the daily meal plan
    Meals {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recorded weights, oldest first
    Weight {
        /// Most recent entries to include
        #[arg(short, long)]
        limit: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show active days for a month or a whole year
    Calendar {
        /// Year (default: current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (default: whole year)
        #[arg(long)]
        month: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show personal records, or the best one for an exercise
    Records {
        /// Exercise name (case-insensitive)
        exercise: Option<String>,
        /// Only the best record per exercise
        #[arg(long, conflicts_with = "exercise")]
        best: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a personal best
    Pr {
        /// Exercise name
        exercise: String,
        /// Weight lifted
        #[arg(short, long)]
        weight: Option<f64>,
        /// Reps performed
        #[arg(short, long)]
        reps: Option<i64>,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record body measurements for a day (lists them if no values given)
    Measure {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        chest: Option<f64>,
        #[arg(long)]
        waist: Option<f64>,
        #[arg(long)]
        hips: Option<f64>,
        #[arg(long)]
        left_arm: Option<f64>,
        #[arg(long)]
        right_arm: Option<f64>,
        #[arg(long)]
        left_thigh: Option<f64>,
        #[arg(long)]
        right_thigh: Option<f64>,
        #[arg(long)]
        neck: Option<f64>,
        #[arg(long)]
        shoulders: Option<f64>,
        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List goals, or add, update and delete them
    Goals {
        #[command(subcommand)]
        command: Option<GoalCommands>,
        /// Output as JSON
        #[arg(long, global = true)]
        json: bool,
    },
    /// Show achievement badges, unlocking any that have been earned
    Badges {
        /// Unlock a badge by ID
        #[arg(long, value_name = "BADGE_ID")]
        unlock: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent workout sessions, newest first
    History {
        /// Most recent sessions to include
        #[arg(short, long)]
        limit: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a finished workout session
    Session {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Workout template ID (default: the plan for that weekday)
        #[arg(long)]
        workout: Option<i64>,
        /// Duration in minutes
        #[arg(short, long)]
        minutes: Option<i64>,
        /// Total volume (default: weight x reps over completed sets that day)
        #[arg(long)]
        volume: Option<f64>,
        /// Calories burned
        #[arg(long, default_value = "0")]
        calories: i64,
        /// Rating 1-5
        #[arg(short, long)]
        rating: Option<i64>,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record one set of an exercise
    Set {
        /// Exercise template ID
        exercise_id: i64,
        /// Set number, starting at 1
        set_number: i64,
        /// Weight used
        #[arg(short, long)]
        weight: Option<f64>,
        /// Reps performed
        #[arg(short, long)]
        reps: Option<i64>,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long, default_value = "today")]
        date: String,
        /// Record the set as not completed
        #[arg(long)]
        skipped: bool,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export every table as one JSON document
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<std::path::PathBuf>,
    },
    /// Delete all logs and templates and restore the default plan
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum ToggleCommands {
    /// Toggle an exercise by template ID
    Exercise {
        /// Exercise template ID
        id: i64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
        /// Sets completed
        #[arg(short, long, default_value = "0")]
        sets: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a meal by template ID
    Meal {
        /// Meal template ID
        id: i64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Mark as not eaten instead
        #[arg(long)]
        undo: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Add a goal
    Add {
        /// Goal type, e.g. weight or strength
        goal_type: String,
        /// Short description
        title: String,
        /// Target value
        #[arg(short, long)]
        target: Option<f64>,
        /// Starting value
        #[arg(long, default_value = "0")]
        current: f64,
        /// Unit for the values, e.g. kg
        #[arg(short, long)]
        unit: Option<String>,
        /// Target date (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(long)]
        due: Option<String>,
    },
    /// Record progress on a goal, or mark it done
    Update {
        /// Goal ID
        id: i64,
        /// New current value
        #[arg(short, long)]
        value: Option<f64>,
        /// Mark the goal completed
        #[arg(long, conflicts_with = "reopen")]
        done: bool,
        /// Mark a completed goal as open again
        #[arg(long)]
        reopen: bool,
    },
    /// Delete a goal
    Delete {
        /// Goal ID
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let service = LiftService::new(&config.db_path)?;

    match cli.command {
        Commands::Day { date, json } => cmd_day(&service, date.as_deref(), json),
        Commands::Toggle { command } => match command {
            ToggleCommands::Exercise {
                id,
                date,
                undo,
                sets,
                json,
            } => cmd_toggle_exercise(&service, id, date.as_deref(), !undo, sets, json),
            ToggleCommands::Meal {
                id,
                date,
                undo,
                json,
            } => cmd_toggle_meal(&service, id, date.as_deref(), !undo, json),
        },
        Commands::Streak { json } => cmd_streak(&service, json),
        Commands::Progress {
            days,
            summary,
            json,
        } => cmd_progress(&service, days, summary, json),
        Commands::Log {
            date,
            weight,
            clear_weight,
            water,
            notes,
            json,
        } => {
            let weight = if clear_weight { Some(None) } else { weight.map(Some) };
            cmd_log(&service, date.as_deref(), weight, water, notes, json)
        }
        Commands::Workouts { day, json } => cmd_workouts(&service, day, json),
        Commands::Meals { json } => cmd_meals(&service, json),
        Commands::Weight { limit, json } => cmd_weight(&service, limit, json),
        Commands::Calendar { year, month, json } => cmd_calendar(&service, year, month, json),
        Commands::Records {
            exercise,
            best,
            json,
        } => cmd_records(&service, exercise.as_deref(), best, json),
        Commands::Pr {
            exercise,
            weight,
            reps,
            date,
            notes,
            json,
        } => {
            let record = NewPersonalRecord {
                exercise_name: exercise,
                weight,
                reps,
                record_date: date,
                notes,
            };
            cmd_record_add(&service, &record, json)
        }
        Commands::Measure {
            date,
            chest,
            waist,
            hips,
            left_arm,
            right_arm,
            left_thigh,
            right_thigh,
            neck,
            shoulders,
            body_fat,
            notes,
            json,
        } => {
            let values = [
                chest,
                waist,
                hips,
                left_arm,
                right_arm,
                left_thigh,
                right_thigh,
                neck,
                shoulders,
                body_fat,
            ];
            if values.iter().all(Option::is_none) {
                return cmd_measurements(&service, json);
            }
            let measurement = NewMeasurement {
                measure_date: date,
                chest,
                waist,
                hips,
                left_arm,
                right_arm,
                left_thigh,
                right_thigh,
                neck,
                shoulders,
                body_fat_percentage: body_fat,
                notes,
            };
            cmd_measure(&service, &measurement, json)
        }
        Commands::Goals { command, json } => match command {
            None => cmd_goals(&service, json),
            Some(GoalCommands::Add {
                goal_type,
                title,
                target,
                current,
                unit,
                due,
            }) => {
                let goal = NewGoal {
                    goal_type,
                    title,
                    target_value: target,
                    current_value: current,
                    unit,
                    target_date: due,
                };
                cmd_goal_add(&service, &goal, json)
            }
            Some(GoalCommands::Update {
                id,
                value,
                done,
                reopen,
            }) => {
                let completed = if done {
                    Some(true)
                } else if reopen {
                    Some(false)
                } else {
                    None
                };
                let update = UpdateGoal {
                    current_value: value,
                    completed,
                };
                cmd_goal_update(&service, id, &update, json)
            }
            Some(GoalCommands::Delete { id }) => cmd_goal_delete(&service, id, json),
        },
        Commands::Badges { unlock, json } => cmd_badges(&service, unlock.as_deref(), json),
        Commands::History { limit, json } => cmd_history(&service, limit, json),
        Commands::Session {
            date,
            workout,
            minutes,
            volume,
            calories,
            rating,
            notes,
            json,
        } => {
            let session = NewWorkoutSession {
                session_date: date,
                workout_id: workout,
                duration_minutes: minutes,
                total_volume: volume,
                calories_burned: calories,
                notes,
                rating,
            };
            cmd_session(&service, &session, json)
        }
        Commands::Set {
            exercise_id,
            set_number,
            weight,
            reps,
            date,
            skipped,
            notes,
            json,
        } => {
            let set = NewExerciseSet {
                date,
                exercise_id,
                set_number,
                weight,
                reps,
                completed: !skipped,
                notes,
            };
            cmd_set(&service, &set, json)
        }
        Commands::Export { output } => cmd_export(&service, output.as_deref()),
        Commands::Reset { yes, json } => cmd_reset(&service, yes, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?.0)
            };
            server::start_server(service, port, &bind, api_key).await
        }
    }
}
