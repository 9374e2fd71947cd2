use chrono::{Duration, NaiveDate};

use crate::error::{Error, Result};
use crate::models::{MAX_PROGRESS_DAYS, ProgressPoint, ProgressSummary};

pub fn validate_window(days: i64) -> Result<()> {
    if (1..=MAX_PROGRESS_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "days must be between 1 and {MAX_PROGRESS_DAYS}, got {days}"
        )))
    }
}

/// First date of a `days`-long window ending at `today` (both ends inclusive).
#[must_use]
pub fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days)
}

/// Roll a window of progress points (ascending by date) into totals and weight trend.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(days: i64, points: &[ProgressPoint]) -> ProgressSummary {
    let mut weights = points.iter().filter_map(|p| p.weight);
    let start_weight = weights.next();
    let latest_weight = weights.last().or(start_weight);

    let weight_change = start_weight
        .zip(latest_weight)
        .map(|(start, latest)| round1(latest - start));

    let average_water = if points.is_empty() {
        0.0
    } else {
        let total: i64 = points.iter().map(|p| p.water_intake).sum();
        round1(total as f64 / points.len() as f64)
    };

    ProgressSummary {
        days,
        days_logged: points.len(),
        active_days: points
            .iter()
            .filter(|p| p.exercises_completed + p.meals_completed > 0)
            .count(),
        exercises_completed: points.iter().map(|p| p.exercises_completed).sum(),
        meals_completed: points.iter().map(|p| p.meals_completed).sum(),
        start_weight,
        latest_weight,
        weight_change,
        average_water,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, weight: Option<f64>, water: i64, ex: i64, meals: i64) -> ProgressPoint {
        ProgressPoint {
            date: date.to_string(),
            weight,
            water_intake: water,
            exercises_completed: ex,
            meals_completed: meals,
        }
    }

    #[test]
    fn test_validate_window_bounds() {
        assert!(validate_window(1).is_ok());
        assert!(validate_window(MAX_PROGRESS_DAYS).is_ok());
        assert!(matches!(validate_window(0), Err(Error::Validation(_))));
        assert!(validate_window(-5).is_err());
        assert!(validate_window(MAX_PROGRESS_DAYS + 1).is_err());
    }

    #[test]
    fn test_window_start_is_inclusive_lower_bound() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            window_start(today, 30),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_summarize_empty_window() {
        let summary = summarize(30, &[]);
        assert_eq!(summary.days_logged, 0);
        assert_eq!(summary.active_days, 0);
        assert_eq!(summary.start_weight, None);
        assert_eq!(summary.weight_change, None);
        assert!(summary.average_water.abs() < f64::EPSILON);
    }

    #[test]
    fn test_summarize_weight_trend_skips_unweighed_days() {
        let points = vec![
            point("2024-03-01", None, 4, 0, 0),
            point("2024-03-02", Some(80.0), 6, 5, 3),
            point("2024-03-03", None, 8, 0, 2),
            point("2024-03-04", Some(78.5), 6, 10, 8),
        ];
        let summary = summarize(7, &points);
        assert_eq!(summary.days, 7);
        assert_eq!(summary.days_logged, 4);
        assert_eq!(summary.active_days, 3);
        assert_eq!(summary.exercises_completed, 15);
        assert_eq!(summary.meals_completed, 13);
        assert_eq!(summary.start_weight, Some(80.0));
        assert_eq!(summary.latest_weight, Some(78.5));
        assert_eq!(summary.weight_change, Some(-1.5));
        assert!((summary.average_water - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summarize_single_weight() {
        let points = vec![point("2024-03-02", Some(72.3), 3, 1, 0)];
        let summary = summarize(30, &points);
        assert_eq!(summary.start_weight, Some(72.3));
        assert_eq!(summary.latest_weight, Some(72.3));
        assert_eq!(summary.weight_change, Some(0.0));
    }
}
