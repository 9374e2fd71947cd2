use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use lift_core::service::LiftService;

use super::helpers::{format_target, truncate};

pub(crate) fn cmd_workouts(service: &LiftService, day: Option<u32>, json: bool) -> Result<()> {
    if let Some(day) = day {
        return print_exercises(service, day, json);
    }

    let workouts = service.workouts()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workouts)?);
    } else {
        #[derive(Tabled)]
        struct WorkoutRow {
            #[tabled(rename = "Day")]
            day: u32,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Workout")]
            workout: String,
            #[tabled(rename = "Muscle groups")]
            muscles: String,
        }

        let rows: Vec<WorkoutRow> = workouts
            .iter()
            .map(|w| WorkoutRow {
                day: w.day_of_week,
                name: w.day_name.clone(),
                workout: w.workout_type.clone(),
                muscles: w.muscle_groups.join(", "),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}

fn print_exercises(service: &LiftService, day: u32, json: bool) -> Result<()> {
    let exercises = service.exercises_for_day(day)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exercises)?);
    } else if exercises.is_empty() {
        eprintln!("No exercises scheduled for day {day}.");
    } else {
        #[derive(Tabled)]
        struct ExerciseRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Order")]
            order: i64,
            #[tabled(rename = "Exercise")]
            name: String,
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Target")]
            target: String,
        }

        let rows: Vec<ExerciseRow> = exercises
            .iter()
            .map(|e| ExerciseRow {
                id: e.id,
                order: e.order_index,
                name: truncate(&e.name, 30),
                category: e.category.to_string(),
                target: format_target(e),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_meals(service: &LiftService, json: bool) -> Result<()> {
    let meals = service.meals()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
    } else {
        #[derive(Tabled)]
        struct MealRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Time")]
            time: String,
            #[tabled(rename = "Meal")]
            name: String,
            #[tabled(rename = "Type")]
            kind: String,
            #[tabled(rename = "Items")]
            items: String,
        }

        let rows: Vec<MealRow> = meals
            .iter()
            .map(|m| MealRow {
                id: m.id,
                time: m.time.clone(),
                name: m.name.clone(),
                kind: m.meal_type.to_string(),
                items: truncate(
                    &m.items
                        .iter()
                        .map(|i| format!("{} ({})", i.name, i.quantity))
                        .collect::<Vec<_>>()
                        .join(", "),
                    60,
                ),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}
