use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use lift_core::models::{DEFAULT_PROGRESS_DAYS, ProgressSummary};
use lift_core::service::LiftService;

use super::helpers::{format_weight, no_neg_zero, plural};

pub(crate) fn cmd_streak(service: &LiftService, json: bool) -> Result<()> {
    let streak = service.streak()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&streak)?);
    } else if streak.streak == 0 {
        println!("No active streak. Tick off a meal or exercise to start one.");
    } else {
        println!("Current streak: {}", plural(streak.streak, "day"));
    }

    Ok(())
}

pub(crate) fn cmd_progress(
    service: &LiftService,
    days: Option<i64>,
    summary: bool,
    json: bool,
) -> Result<()> {
    if summary {
        let summary = service.progress_summary(days)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }
        return Ok(());
    }

    let points = service.progress(days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else if points.is_empty() {
        let days = days.unwrap_or(DEFAULT_PROGRESS_DAYS);
        eprintln!("No days logged in the last {}.", plural(days, "day"));
    } else {
        #[derive(Tabled)]
        struct ProgressRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Weight")]
            weight: String,
            #[tabled(rename = "Water")]
            water: i64,
            #[tabled(rename = "Exercises")]
            exercises: i64,
            #[tabled(rename = "Meals")]
            meals: i64,
        }

        let rows: Vec<ProgressRow> = points
            .iter()
            .map(|p| ProgressRow {
                date: p.date.clone(),
                weight: format_weight(p.weight),
                water: p.water_intake,
                exercises: p.exercises_completed,
                meals: p.meals_completed,
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..5)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

fn print_summary(summary: &ProgressSummary) {
    println!("Last {}", plural(summary.days, "day"));
    println!("  Days logged:          {}", summary.days_logged);
    println!("  Active days:          {}", summary.active_days);
    println!("  Exercises completed:  {}", summary.exercises_completed);
    println!("  Meals completed:      {}", summary.meals_completed);
    println!("  Average water:        {:.1} glasses", summary.average_water);
    if let (Some(start), Some(latest)) = (summary.start_weight, summary.latest_weight) {
        let change = no_neg_zero(summary.weight_change.unwrap_or_default());
        println!("  Weight:               {start:.1} -> {latest:.1} ({change:+.1})");
    }
}

pub(crate) fn cmd_weight(service: &LiftService, limit: Option<i64>, json: bool) -> Result<()> {
    let history = service.weight_history(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
    } else if history.is_empty() {
        eprintln!("No weight recorded yet. Use `lift log --weight <value>` to add one.");
    } else {
        #[derive(Tabled)]
        struct WeightRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Weight")]
            weight: String,
            #[tabled(rename = "Change")]
            change: String,
        }

        let mut previous: Option<f64> = None;
        let rows: Vec<WeightRow> = history
            .iter()
            .map(|p| {
                let change = previous.map_or_else(String::new, |prev| {
                    format!("{:+.1}", no_neg_zero(p.weight - prev))
                });
                previous = Some(p.weight);
                WeightRow {
                    date: p.date.clone(),
                    weight: format!("{:.1}", p.weight),
                    change,
                }
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_calendar(
    service: &LiftService,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
) -> Result<()> {
    let days = service.activity_calendar(year, month)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
    } else if days.is_empty() {
        eprintln!("No active days in this period.");
    } else {
        #[derive(Tabled)]
        struct CalendarRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Exercises")]
            exercises: i64,
            #[tabled(rename = "Meals")]
            meals: i64,
        }

        let rows: Vec<CalendarRow> = days
            .iter()
            .map(|d| CalendarRow {
                date: d.date.clone(),
                exercises: d.exercises_completed,
                meals: d.meals_completed,
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
        println!("{}", plural(i64::try_from(days.len())?, "active day"));
    }

    Ok(())
}
