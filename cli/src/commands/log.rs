use anyhow::Result;

use lift_core::models::{DailyLog, UpdateDailyLog, date_key};
use lift_core::service::LiftService;

use super::helpers::format_weight;

#[allow(clippy::option_option)]
pub(crate) fn cmd_log(
    service: &LiftService,
    date: Option<&str>,
    weight: Option<Option<f64>>,
    water: Option<i64>,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let date = date.unwrap_or("today");
    let update = UpdateDailyLog {
        weight,
        water_intake: water,
        notes,
    };

    // No fields: show what is recorded without creating a log.
    if update.is_empty() {
        let log = service.daily_log(date)?;
        if json {
            println!("{}", lookup_json(log.as_ref())?);
            return Ok(());
        }
        match log {
            Some(log) => print_log(&log),
            None => {
                let day = date_key(service.resolve_date(date)?);
                eprintln!("No log for {day}. Use `lift log --weight <value>` to start one.");
            }
        }
        return Ok(());
    }

    let log = service.update_daily_log(date, &update)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
    } else {
        print_log(&log);
    }

    Ok(())
}

/// A missing log renders as `null`, the same as the API's empty lookups.
fn lookup_json(log: Option<&DailyLog>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&log)
}

fn print_log(log: &DailyLog) {
    println!(
        "{}: weight {}, water {} glasses",
        date_key(log.date),
        format_weight(log.weight),
        log.water_intake
    );
    if !log.notes.is_empty() {
        println!("  Notes: {}", log.notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LiftService {
        LiftService::new_in_memory()
            .unwrap()
            .with_today("2024-06-20".parse().unwrap())
    }

    #[test]
    fn test_missing_log_renders_null() {
        let service = service();
        let log = service.daily_log("today").unwrap();
        assert_eq!(lookup_json(log.as_ref()).unwrap(), "null");
        // a lookup never creates the log
        assert!(service.daily_log("today").unwrap().is_none());
    }

    #[test]
    fn test_existing_log_renders_object() {
        let service = service();
        cmd_log(&service, Some("today"), Some(Some(80.2)), Some(4), None, true).unwrap();
        let log = service.daily_log("2024-06-20").unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&lookup_json(log.as_ref()).unwrap()).unwrap();
        assert_eq!(value["weight"], 80.2);
        assert_eq!(value["water_intake"], 4);
    }

    #[test]
    fn test_lookup_with_json_succeeds_without_log() {
        let service = service();
        cmd_log(&service, Some("yesterday"), None, None, None, true).unwrap();
        assert!(service.daily_log("yesterday").unwrap().is_none());
    }
}
