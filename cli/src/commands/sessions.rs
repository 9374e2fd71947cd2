use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use lift_core::models::{NewExerciseSet, NewWorkoutSession, date_key};
use lift_core::service::LiftService;

use super::helpers::{check_mark, format_weight, truncate};

pub(crate) fn cmd_history(service: &LiftService, limit: Option<i64>, json: bool) -> Result<()> {
    let sessions = service.workout_history(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }
    if sessions.is_empty() {
        eprintln!("No workout sessions yet. Log one with `lift session`.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct SessionRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Workout")]
        workout: String,
        #[tabled(rename = "Minutes")]
        minutes: String,
        #[tabled(rename = "Volume")]
        volume: String,
        #[tabled(rename = "Rating")]
        rating: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<SessionRow> = sessions
        .iter()
        .map(|s| SessionRow {
            date: date_key(s.session_date),
            workout: s.workout_type.clone().unwrap_or_else(|| "-".to_string()),
            minutes: s
                .duration_minutes
                .map_or_else(|| "-".to_string(), |m| m.to_string()),
            volume: format!("{:.0}", s.total_volume),
            rating: s
                .rating
                .and_then(|r| usize::try_from(r).ok())
                .map_or_else(String::new, |r| "★".repeat(r)),
            notes: truncate(&s.notes, 40),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_session(
    service: &LiftService,
    session: &NewWorkoutSession,
    json: bool,
) -> Result<()> {
    let saved = service.log_workout_session(session)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!(
            "Logged {} on {} (volume {:.0})",
            saved.workout_type.as_deref().unwrap_or("workout"),
            date_key(saved.session_date),
            saved.total_volume
        );
    }

    Ok(())
}

pub(crate) fn cmd_set(service: &LiftService, set: &NewExerciseSet, json: bool) -> Result<()> {
    service.log_exercise_set(set)?;
    let sets = service.exercise_sets(&set.date, set.exercise_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sets)?);
        return Ok(());
    }

    #[derive(Tabled)]
    struct SetRow {
        #[tabled(rename = "Set")]
        number: i64,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Reps")]
        reps: String,
        #[tabled(rename = "Done")]
        done: &'static str,
    }

    let rows: Vec<SetRow> = sets
        .iter()
        .map(|s| SetRow {
            number: s.set_number,
            weight: format_weight(s.weight),
            reps: s.reps.map_or_else(|| "-".to_string(), |r| r.to_string()),
            done: check_mark(s.completed),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
