use std::path::Path;

use anyhow::{Context, Result, bail};

use lift_core::service::LiftService;

pub(crate) fn cmd_export(service: &LiftService, output: Option<&Path>) -> Result<()> {
    let data = service.export_all()?;
    let body = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            eprintln!(
                "Exported {} daily logs to {}",
                data.daily_logs.len(),
                path.display()
            );
        }
        None => println!("{body}"),
    }

    Ok(())
}

pub(crate) fn cmd_reset(service: &LiftService, yes: bool, json: bool) -> Result<()> {
    if !yes {
        bail!("Reset deletes every log and custom template. Re-run with --yes to confirm");
    }

    service.reset_all()?;

    if json {
        println!("{}", serde_json::json!({ "success": true }));
    } else {
        println!("All logs cleared and the default plan restored");
    }

    Ok(())
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
    fn test_reset_requires_confirmation() {
        let service = service();
        let meal_id = service.meals().unwrap()[0].id;
        service.toggle_meal("2024-06-20", meal_id, true).unwrap();

        assert!(cmd_reset(&service, false, true).is_err());
        assert_eq!(service.streak().unwrap().streak, 1);

        cmd_reset(&service, true, true).unwrap();
        assert_eq!(service.streak().unwrap().streak, 0);
    }

    #[test]
    fn test_export_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("export.json");
        let service = service();

        cmd_export(&service, Some(&path)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["version"], 2);
        assert_eq!(written["meals"].as_array().unwrap().len(), 8);
    }
}
