use anyhow::Result;

use lift_core::models::date_key;
use lift_core::service::LiftService;

pub(crate) fn cmd_toggle_exercise(
    service: &LiftService,
    id: i64,
    date: Option<&str>,
    completed: bool,
    sets: i64,
    json: bool,
) -> Result<()> {
    let date = date_key(service.resolve_date(date.unwrap_or("today"))?);
    service.toggle_exercise(&date, id, completed, sets)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "date": date,
                "exercise_id": id,
                "completed": completed,
                "sets_completed": sets,
            })
        );
    } else if completed {
        println!("Marked exercise {id} done for {date} ({sets} sets)");
    } else {
        println!("Cleared exercise {id} for {date}");
    }

    Ok(())
}

pub(crate) fn cmd_toggle_meal(
    service: &LiftService,
    id: i64,
    date: Option<&str>,
    completed: bool,
    json: bool,
) -> Result<()> {
    let date = date_key(service.resolve_date(date.unwrap_or("today"))?);
    service.toggle_meal(&date, id, completed)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "date": date,
                "meal_id": id,
                "completed": completed,
            })
        );
    } else if completed {
        println!("Marked meal {id} eaten for {date}");
    } else {
        println!("Cleared meal {id} for {date}");
    }

    Ok(())
}
