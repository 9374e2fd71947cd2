use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use lift_core::models::DayView;
use lift_core::service::LiftService;

use super::helpers::{check_mark, format_target, format_weight, truncate};

pub(crate) fn cmd_day(service: &LiftService, date: Option<&str>, json: bool) -> Result<()> {
    let view = service.day_view(date.unwrap_or("today"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_day_view(&view);
    }

    Ok(())
}

fn print_day_view(view: &DayView) {
    match &view.workout {
        Some(w) => {
            println!("{}  {}: {}", view.date, w.day_name, w.workout_type);
            if !w.muscle_groups.is_empty() {
                println!("Muscle groups: {}", w.muscle_groups.join(", "));
            }
        }
        None => println!("{}  No workout planned", view.date),
    }

    let rest_day = view.workout.as_ref().is_some_and(|w| w.is_rest_day);
    if rest_day {
        println!("\nRest day. No exercises scheduled.");
    } else if !view.exercises.is_empty() {
        #[derive(Tabled)]
        struct ExerciseRow {
            #[tabled(rename = "Done")]
            done: &'static str,
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Exercise")]
            name: String,
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Target")]
            target: String,
            #[tabled(rename = "Sets done")]
            sets: i64,
        }

        let rows: Vec<ExerciseRow> = view
            .exercises
            .iter()
            .map(|s| ExerciseRow {
                done: check_mark(s.completed),
                id: s.exercise.id,
                name: truncate(&s.exercise.name, 30),
                category: s.exercise.category.to_string(),
                target: format_target(&s.exercise),
                sets: s.sets_completed,
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(4..6)).with(Alignment::right()))
            .to_string();
        println!("\n{table}");
    }

    if !view.meals.is_empty() {
        #[derive(Tabled)]
        struct MealRow {
            #[tabled(rename = "Done")]
            done: &'static str,
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Time")]
            time: String,
            #[tabled(rename = "Meal")]
            name: String,
            #[tabled(rename = "Items")]
            items: String,
        }

        let rows: Vec<MealRow> = view
            .meals
            .iter()
            .map(|s| MealRow {
                done: check_mark(s.completed),
                id: s.meal.id,
                time: s.meal.time.clone(),
                name: s.meal.name.clone(),
                items: truncate(
                    &s.meal
                        .items
                        .iter()
                        .map(|i| i.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    50,
                ),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("\n{table}");
    }

    let c = &view.completion;
    println!(
        "\nWorkout: {}/{} ({}%)   Diet: {}/{} ({}%)",
        c.exercises_completed,
        c.exercises_total,
        c.workout_pct,
        c.meals_completed,
        c.meals_total,
        c.diet_pct
    );

    let log = &view.daily_log;
    println!(
        "Weight: {}   Water: {} glasses",
        format_weight(log.weight),
        log.water_intake
    );
    if !log.notes.is_empty() {
        println!("Notes: {}", log.notes);
    }
}
