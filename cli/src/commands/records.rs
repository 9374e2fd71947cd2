use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use lift_core::models::{
    BodyMeasurement, NewMeasurement, NewPersonalRecord, PersonalRecord, date_key,
};
use lift_core::service::LiftService;

use super::helpers::{format_weight, truncate};

pub(crate) fn cmd_records(
    service: &LiftService,
    exercise: Option<&str>,
    best: bool,
    json: bool,
) -> Result<()> {
    if let Some(name) = exercise {
        let record = service.best_personal_record(name)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else if let Some(record) = record {
            print_records(&[record]);
        } else {
            eprintln!("No personal record for '{name}' yet.");
        }
        return Ok(());
    }

    let records = if best {
        service.best_personal_records()?
    } else {
        service.personal_records()?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        eprintln!("No personal records yet. Add one with `lift pr <exercise> --weight <kg>`.");
    } else {
        print_records(&records);
    }

    Ok(())
}

pub(crate) fn cmd_record_add(
    service: &LiftService,
    record: &NewPersonalRecord,
    json: bool,
) -> Result<()> {
    let saved = service.add_personal_record(record)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!(
            "New record for {} on {}: {}",
            saved.exercise_name,
            date_key(saved.record_date),
            describe_lift(&saved)
        );
    }

    Ok(())
}

/// "100.0 x 5", or whichever half was recorded.
fn describe_lift(record: &PersonalRecord) -> String {
    match (record.weight, record.reps) {
        (Some(w), Some(r)) => format!("{w:.1} x {r}"),
        (Some(w), None) => format!("{w:.1}"),
        (None, Some(r)) => format!("{r} reps"),
        (None, None) => "-".to_string(),
    }
}

fn print_records(records: &[PersonalRecord]) {
    #[derive(Tabled)]
    struct RecordRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Exercise")]
        exercise: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Reps")]
        reps: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            date: date_key(r.record_date),
            exercise: truncate(&r.exercise_name, 30),
            weight: format_weight(r.weight),
            reps: r.reps.map_or_else(|| "-".to_string(), |n| n.to_string()),
            notes: truncate(&r.notes, 40),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_measure(
    service: &LiftService,
    measurement: &NewMeasurement,
    json: bool,
) -> Result<()> {
    let saved = service.save_measurement(measurement)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!("Measurements saved for {}", date_key(saved.measure_date));
    }

    Ok(())
}

#[derive(Tabled)]
struct MeasurementRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Chest")]
    chest: String,
    #[tabled(rename = "Waist")]
    waist: String,
    #[tabled(rename = "Hips")]
    hips: String,
    #[tabled(rename = "Arms L/R")]
    arms: String,
    #[tabled(rename = "Thighs L/R")]
    thighs: String,
    #[tabled(rename = "Body fat %")]
    body_fat: String,
}

impl From<&BodyMeasurement> for MeasurementRow {
    fn from(m: &BodyMeasurement) -> Self {
        Self {
            date: date_key(m.measure_date),
            chest: format_weight(m.chest),
            waist: format_weight(m.waist),
            hips: format_weight(m.hips),
            arms: format!("{}/{}", format_weight(m.left_arm), format_weight(m.right_arm)),
            thighs: format!(
                "{}/{}",
                format_weight(m.left_thigh),
                format_weight(m.right_thigh)
            ),
            body_fat: format_weight(m.body_fat_percentage),
        }
    }
}

pub(crate) fn cmd_measurements(service: &LiftService, json: bool) -> Result<()> {
    let measurements = service.measurements()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&measurements)?);
        return Ok(());
    }
    if measurements.is_empty() {
        eprintln!("No measurements yet. Record some with `lift measure --waist <cm>`.");
        return Ok(());
    }

    let rows: Vec<MeasurementRow> = measurements.iter().map(MeasurementRow::from).collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
