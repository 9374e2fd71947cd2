use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_PROGRESS_DAYS: i64 = 30;
pub const MAX_PROGRESS_DAYS: i64 = 3650;
pub const DEFAULT_WEIGHT_HISTORY_LIMIT: i64 = 90;
pub const DEFAULT_WORKOUT_HISTORY_LIMIT: i64 = 30;

#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Resolve a user-supplied day: `YYYY-MM-DD`, `today`, `yesterday` or `tomorrow`.
pub fn parse_day(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        "tomorrow" => Ok(today + Duration::days(1)),
        _ => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map_err(|_| Error::InvalidDate(input.to_string())),
    }
}

// --- Template catalog types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ExerciseCategory {
    Warmup,
    Chest,
    Back,
    Shoulder,
    Triceps,
    Biceps,
    Traps,
    Legs,
    Forearms,
    Abs,
    Cardio,
}

impl ExerciseCategory {
    pub const ALL: &'static [ExerciseCategory] = &[
        Self::Warmup,
        Self::Chest,
        Self::Back,
        Self::Shoulder,
        Self::Triceps,
        Self::Biceps,
        Self::Traps,
        Self::Legs,
        Self::Forearms,
        Self::Abs,
        Self::Cardio,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warmup => "Warmup",
            Self::Chest => "Chest",
            Self::Back => "Back",
            Self::Shoulder => "Shoulder",
            Self::Triceps => "Triceps",
            Self::Biceps => "Biceps",
            Self::Traps => "Traps",
            Self::Legs => "Legs",
            Self::Forearms => "Forearms",
            Self::Abs => "Abs",
            Self::Cardio => "Cardio",
        }
    }
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                Error::validation(format!(
                    "Invalid exercise category '{s}'. Must be one of: {}",
                    names.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum MealKind {
    PreWorkout,
    PostWorkout,
    Main,
    Snack,
    Night,
}

impl MealKind {
    pub const ALL: &'static [MealKind] = &[
        Self::PreWorkout,
        Self::PostWorkout,
        Self::Main,
        Self::Snack,
        Self::Night,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreWorkout => "pre_workout",
            Self::PostWorkout => "post_workout",
            Self::Main => "main",
            Self::Snack => "snack",
            Self::Night => "night",
        }
    }
}

impl fmt::Display for MealKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                Error::validation(format!(
                    "Invalid meal type '{s}'. Must be one of: {}",
                    names.join(", ")
                ))
            })
    }
}

macro_rules! text_column {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_column!(ExerciseCategory);
text_column!(MealKind);

impl TryFrom<String> for ExerciseCategory {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl TryFrom<String> for MealKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub id: i64,
    pub day_of_week: u32,
    pub day_name: String,
    pub workout_type: String,
    pub muscle_groups: Vec<String>,
    pub is_rest_day: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    pub id: i64,
    pub workout_id: i64,
    pub day_of_week: u32,
    pub name: String,
    pub target_sets: i64,
    pub target_reps: String,
    pub category: ExerciseCategory,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    pub name: String,
    pub quantity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealTemplate {
    pub id: i64,
    pub name: String,
    pub time: String,
    pub meal_type: MealKind,
    pub items: Vec<MealItem>,
    pub order_index: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExercise {
    pub day_of_week: u32,
    pub name: String,
    pub target_sets: i64,
    pub target_reps: String,
    pub category: ExerciseCategory,
    #[serde(default)]
    pub order_index: i64,
}

impl NewExercise {
    pub fn validate(&self) -> Result<()> {
        if self.day_of_week > 6 {
            return Err(Error::validation(
                "day_of_week must be between 0 (Sunday) and 6 (Saturday)",
            ));
        }
        if self.name.trim().is_empty() {
            return Err(Error::validation("Exercise name must not be empty"));
        }
        if self.target_sets < 1 {
            return Err(Error::validation("target_sets must be at least 1"));
        }
        if self.target_reps.trim().is_empty() {
            return Err(Error::validation("target_reps must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMeal {
    pub name: String,
    pub time: String,
    pub meal_type: MealKind,
    #[serde(default)]
    pub items: Vec<MealItem>,
    #[serde(default)]
    pub order_index: i64,
}

impl NewMeal {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Meal name must not be empty"));
        }
        if self.time.trim().is_empty() {
            return Err(Error::validation("Meal time must not be empty"));
        }
        if self.items.iter().any(|i| i.name.trim().is_empty()) {
            return Err(Error::validation("Meal item names must not be empty"));
        }
        Ok(())
    }
}

// --- Daily log types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    pub id: i64,
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub water_intake: i64,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update for a daily log. `weight: Some(None)` clears the weight.
#[derive(Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct UpdateDailyLog {
    pub weight: Option<Option<f64>>,
    pub water_intake: Option<i64>,
    pub notes: Option<String>,
}

impl UpdateDailyLog {
    pub fn validate(&self) -> Result<()> {
        if let Some(Some(w)) = self.weight {
            if !w.is_finite() || w <= 0.0 {
                return Err(Error::validation("weight must be greater than 0"));
            }
        }
        if self.water_intake.is_some_and(|w| w < 0) {
            return Err(Error::validation("water_intake must not be negative"));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.water_intake.is_none() && self.notes.is_none()
    }
}

// --- Day view types ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseStatus {
    #[serde(flatten)]
    pub exercise: ExerciseTemplate,
    pub completed: bool,
    pub sets_completed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealStatus {
    #[serde(flatten)]
    pub meal: MealTemplate,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCompletion {
    pub exercises_completed: usize,
    pub exercises_total: usize,
    pub meals_completed: usize,
    pub meals_total: usize,
    pub workout_pct: u32,
    pub diet_pct: u32,
}

impl DayCompletion {
    #[must_use]
    pub fn from_statuses(exercises: &[ExerciseStatus], meals: &[MealStatus]) -> Self {
        let exercises_completed = exercises.iter().filter(|e| e.completed).count();
        let meals_completed = meals.iter().filter(|m| m.completed).count();
        Self {
            exercises_completed,
            exercises_total: exercises.len(),
            meals_completed,
            meals_total: meals.len(),
            workout_pct: percent(exercises_completed, exercises.len()),
            diet_pct: percent(meals_completed, meals.len()),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (done as f64 * 100.0 / total as f64).round() as u32
}

/// Denormalized snapshot of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub date: String,
    pub day_of_week: u32,
    pub workout: Option<WorkoutTemplate>,
    pub exercises: Vec<ExerciseStatus>,
    pub meals: Vec<MealStatus>,
    pub daily_log: DailyLog,
    pub completion: DayCompletion,
}

// --- Progress types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPoint {
    pub date: String,
    pub weight: Option<f64>,
    pub water_intake: i64,
    pub exercises_completed: i64,
    pub meals_completed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub days: i64,
    pub days_logged: usize,
    pub active_days: usize,
    pub exercises_completed: i64,
    pub meals_completed: i64,
    pub start_weight: Option<f64>,
    pub latest_weight: Option<f64>,
    pub weight_change: Option<f64>,
    pub average_water: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub streak: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightPoint {
    pub date: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveDay {
    pub date: String,
    pub exercises_completed: i64,
    pub meals_completed: i64,
}

// --- Personal records ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub id: i64,
    pub exercise_name: String,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub record_date: NaiveDate,
    pub notes: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPersonalRecord {
    #[serde(alias = "exerciseName")]
    pub exercise_name: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<i64>,
    /// Defaults to today. Accepts the same keywords as any other date input.
    #[serde(default, alias = "recordDate")]
    pub record_date: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl NewPersonalRecord {
    pub fn validate(&self) -> Result<()> {
        if self.exercise_name.trim().is_empty() {
            return Err(Error::validation("Exercise name must not be empty"));
        }
        if self.weight.is_none() && self.reps.is_none() {
            return Err(Error::validation(
                "A personal record needs a weight, reps, or both",
            ));
        }
        if self.weight.is_some_and(|w| !w.is_finite() || w <= 0.0) {
            return Err(Error::validation("weight must be greater than 0"));
        }
        if self.reps.is_some_and(|r| r < 1) {
            return Err(Error::validation("reps must be at least 1"));
        }
        Ok(())
    }
}

// --- Body measurements ---

/// Circumferences in whatever unit the user measures in; one row per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurement {
    pub id: i64,
    pub measure_date: NaiveDate,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub left_arm: Option<f64>,
    pub right_arm: Option<f64>,
    pub left_thigh: Option<f64>,
    pub right_thigh: Option<f64>,
    pub neck: Option<f64>,
    pub shoulders: Option<f64>,
    pub body_fat_percentage: Option<f64>,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewMeasurement {
    #[serde(alias = "measureDate")]
    pub measure_date: Option<String>,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    #[serde(alias = "leftArm")]
    pub left_arm: Option<f64>,
    #[serde(alias = "rightArm")]
    pub right_arm: Option<f64>,
    #[serde(alias = "leftThigh")]
    pub left_thigh: Option<f64>,
    #[serde(alias = "rightThigh")]
    pub right_thigh: Option<f64>,
    pub neck: Option<f64>,
    pub shoulders: Option<f64>,
    #[serde(alias = "bodyFatPercentage")]
    pub body_fat_percentage: Option<f64>,
    pub notes: String,
}

impl NewMeasurement {
    fn lengths(&self) -> [(&'static str, Option<f64>); 9] {
        [
            ("chest", self.chest),
            ("waist", self.waist),
            ("hips", self.hips),
            ("left_arm", self.left_arm),
            ("right_arm", self.right_arm),
            ("left_thigh", self.left_thigh),
            ("right_thigh", self.right_thigh),
            ("neck", self.neck),
            ("shoulders", self.shoulders),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.lengths() {
            if value.is_some_and(|v| !v.is_finite() || v <= 0.0) {
                return Err(Error::validation(format!("{name} must be greater than 0")));
            }
        }
        if self
            .body_fat_percentage
            .is_some_and(|v| !(v > 0.0 && v < 100.0))
        {
            return Err(Error::validation(
                "body_fat_percentage must be between 0 and 100",
            ));
        }
        if self.lengths().iter().all(|(_, v)| v.is_none()) && self.body_fat_percentage.is_none() {
            return Err(Error::validation("At least one measurement must be provided"));
        }
        Ok(())
    }
}

// --- Goals ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub goal_type: String,
    pub title: String,
    pub target_value: Option<f64>,
    pub current_value: f64,
    pub unit: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub completed: bool,
    pub completed_date: Option<NaiveDate>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
    #[serde(alias = "goalType")]
    pub goal_type: String,
    pub title: String,
    #[serde(default, alias = "targetValue")]
    pub target_value: Option<f64>,
    #[serde(default, alias = "currentValue")]
    pub current_value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, alias = "targetDate")]
    pub target_date: Option<String>,
}

impl NewGoal {
    pub fn validate(&self) -> Result<()> {
        if self.goal_type.trim().is_empty() {
            return Err(Error::validation("goal_type must not be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(Error::validation("Goal title must not be empty"));
        }
        if self.target_value.is_some_and(|v| !v.is_finite()) || !self.current_value.is_finite() {
            return Err(Error::validation("Goal values must be finite numbers"));
        }
        Ok(())
    }
}

/// Progress update for a goal. `completed: Some(true)` stamps `completed_date`,
/// `Some(false)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateGoal {
    #[serde(alias = "currentValue")]
    pub current_value: Option<f64>,
    pub completed: Option<bool>,
}

// --- Achievements ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub badge_id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
    pub unlocked_date: Option<NaiveDate>,
}

// --- Workout sessions & sets ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: i64,
    pub session_date: NaiveDate,
    pub workout_id: Option<i64>,
    pub workout_type: Option<String>,
    pub muscle_groups: Vec<String>,
    pub duration_minutes: Option<i64>,
    pub total_volume: f64,
    pub calories_burned: i64,
    pub notes: String,
    pub rating: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewWorkoutSession {
    #[serde(alias = "sessionDate")]
    pub session_date: Option<String>,
    /// Defaults to the plan for the session's weekday.
    #[serde(alias = "workoutId")]
    pub workout_id: Option<i64>,
    #[serde(alias = "durationMinutes")]
    pub duration_minutes: Option<i64>,
    /// Defaults to the sum of weight x reps over completed sets logged that day.
    #[serde(alias = "totalVolume")]
    pub total_volume: Option<f64>,
    #[serde(alias = "caloriesBurned")]
    pub calories_burned: i64,
    pub notes: String,
    pub rating: Option<i64>,
}

impl NewWorkoutSession {
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes.is_some_and(|d| d < 0) {
            return Err(Error::validation("duration_minutes must not be negative"));
        }
        if self.total_volume.is_some_and(|v| !v.is_finite() || v < 0.0) {
            return Err(Error::validation("total_volume must not be negative"));
        }
        if self.calories_burned < 0 {
            return Err(Error::validation("calories_burned must not be negative"));
        }
        if self.rating.is_some_and(|r| !(1..=5).contains(&r)) {
            return Err(Error::validation("rating must be between 1 and 5"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub id: i64,
    pub date: String,
    pub exercise_id: i64,
    pub set_number: i64,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub completed: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExerciseSet {
    pub date: String,
    #[serde(alias = "exerciseId")]
    pub exercise_id: i64,
    #[serde(alias = "setNumber")]
    pub set_number: i64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<i64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
}

impl NewExerciseSet {
    pub fn validate(&self) -> Result<()> {
        if self.set_number < 1 {
            return Err(Error::validation("set_number must be at least 1"));
        }
        if self.weight.is_some_and(|w| !w.is_finite() || w < 0.0) {
            return Err(Error::validation("weight must not be negative"));
        }
        if self.reps.is_some_and(|r| r < 0) {
            return Err(Error::validation("reps must not be negative"));
        }
        Ok(())
    }
}

// --- Export types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportExerciseLog {
    pub date: String,
    pub exercise_id: i64,
    pub completed: bool,
    pub sets_completed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMealLog {
    pub date: String,
    pub meal_id: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    pub workouts: Vec<WorkoutTemplate>,
    pub exercises: Vec<ExerciseTemplate>,
    pub meals: Vec<MealTemplate>,
    pub daily_logs: Vec<DailyLog>,
    pub exercise_logs: Vec<ExportExerciseLog>,
    pub meal_logs: Vec<ExportMealLog>,
    pub personal_records: Vec<PersonalRecord>,
    pub body_measurements: Vec<BodyMeasurement>,
    pub goals: Vec<Goal>,
    pub achievements: Vec<Achievement>,
    pub workout_sessions: Vec<WorkoutSession>,
    pub exercise_sets: Vec<ExerciseSet>,
    pub settings: BTreeMap<String, String>,
}
