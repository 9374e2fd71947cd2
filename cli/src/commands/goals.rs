use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use lift_core::models::{Goal, NewGoal, UpdateGoal, date_key};
use lift_core::service::LiftService;

use super::helpers::{check_mark, truncate};

pub(crate) fn cmd_goals(service: &LiftService, json: bool) -> Result<()> {
    let goals = service.goals()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
        return Ok(());
    }
    if goals.is_empty() {
        eprintln!("No goals yet. Add one with `lift goals add <type> <title>`.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Goal")]
        title: String,
        #[tabled(rename = "Progress")]
        progress: String,
        #[tabled(rename = "Due")]
        due: String,
        #[tabled(rename = "Done")]
        done: &'static str,
    }

    let rows: Vec<GoalRow> = goals
        .iter()
        .map(|g| GoalRow {
            id: g.id,
            kind: g.goal_type.clone(),
            title: truncate(&g.title, 40),
            progress: format_progress(g),
            due: g.target_date.map_or_else(|| "-".to_string(), date_key),
            done: check_mark(g.completed),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// "78.5 / 75 kg", or just the current value when there is no target.
fn format_progress(goal: &Goal) -> String {
    let unit = goal
        .unit
        .as_deref()
        .map(|u| format!(" {u}"))
        .unwrap_or_default();
    match goal.target_value {
        Some(target) => format!("{} / {target}{unit}", goal.current_value),
        None => format!("{}{unit}", goal.current_value),
    }
}

pub(crate) fn cmd_goal_add(service: &LiftService, goal: &NewGoal, json: bool) -> Result<()> {
    let saved = service.add_goal(goal)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!("Added goal {}: {}", saved.id, saved.title);
    }

    Ok(())
}

pub(crate) fn cmd_goal_update(
    service: &LiftService,
    id: i64,
    update: &UpdateGoal,
    json: bool,
) -> Result<()> {
    let goal = service.update_goal(id, update)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goal)?);
    } else if let Some(date) = goal.completed_date {
        println!("{} completed on {}", goal.title, date_key(date));
    } else {
        println!("{}: {}", goal.title, format_progress(&goal));
    }

    Ok(())
}

pub(crate) fn cmd_goal_delete(service: &LiftService, id: i64, json: bool) -> Result<()> {
    service.delete_goal(id)?;

    if json {
        println!("{}", serde_json::json!({ "success": true }));
    } else {
        println!("Deleted goal {id}");
    }

    Ok(())
}

pub(crate) fn cmd_badges(service: &LiftService, unlock: Option<&str>, json: bool) -> Result<()> {
    if let Some(badge_id) = unlock {
        let badge = service.unlock_achievement(badge_id)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&badge)?);
        } else {
            println!("{} {} unlocked", badge.icon, badge.name);
        }
        return Ok(());
    }

    let badges = service.achievements()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&badges)?);
        return Ok(());
    }

    #[derive(Tabled)]
    struct BadgeRow {
        #[tabled(rename = "")]
        icon: String,
        #[tabled(rename = "Badge")]
        name: String,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Unlocked")]
        unlocked: String,
    }

    let rows: Vec<BadgeRow> = badges
        .iter()
        .map(|b| BadgeRow {
            icon: b.icon.clone(),
            name: b.name.clone(),
            id: b.badge_id.clone(),
            description: b.description.clone(),
            unlocked: b.unlocked_date.map_or_else(String::new, date_key),
        })
        .collect();

    let unlocked = badges.iter().filter(|b| b.unlocked).count();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("{unlocked} of {} badges unlocked", badges.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target_value: Option<f64>, unit: Option<&str>) -> Goal {
        Goal {
            id: 1,
            goal_type: "weight".to_string(),
            title: "Cut".to_string(),
            target_value,
            current_value: 78.5,
            unit: unit.map(str::to_string),
            target_date: None,
            completed: false,
            completed_date: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(format_progress(&goal(Some(75.0), Some("kg"))), "78.5 / 75 kg");
        assert_eq!(format_progress(&goal(None, None)), "78.5");
    }

    #[test]
    fn test_goal_update_missing_is_error() {
        let service = LiftService::new_in_memory().unwrap();
        assert!(cmd_goal_update(&service, 99, &UpdateGoal::default(), true).is_err());
        assert!(cmd_goal_delete(&service, 99, true).is_err());
    }

    #[test]
    fn test_badge_unlock_unknown_is_error() {
        let service = LiftService::new_in_memory()
            .unwrap()
            .with_today("2024-06-20".parse().unwrap());
        assert!(cmd_badges(&service, Some("moonwalk"), true).is_err());
        cmd_badges(&service, Some("iron_will"), true).unwrap();
        assert!(service.achievements().unwrap()[0].unlocked);
    }
}
