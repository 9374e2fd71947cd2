use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, Local, NaiveDate};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    Achievement, ActiveDay, BodyMeasurement, DEFAULT_PROGRESS_DAYS, DEFAULT_WEIGHT_HISTORY_LIMIT,
    DEFAULT_WORKOUT_HISTORY_LIMIT, DailyLog, DayView, ExerciseSet, ExerciseTemplate, ExportData,
    Goal, MealTemplate, NewExercise, NewExerciseSet, NewGoal, NewMeal, NewMeasurement,
    NewPersonalRecord, NewWorkoutSession, PersonalRecord, ProgressPoint, ProgressSummary, Streak,
    UpdateDailyLog, UpdateGoal, WeightPoint, WorkoutSession, WorkoutTemplate, parse_day,
};
use crate::streak::{STREAK_RULE_SETTING, StreakRule};

/// String-input facade over [`Database`]. Resolves "today" from the local clock
/// unless a date has been pinned with [`LiftService::with_today`].
pub struct LiftService {
    db: Database,
    pinned_today: Option<NaiveDate>,
}

impl LiftService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self {
            db,
            pinned_today: None,
        })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db,
            pinned_today: None,
        })
    }

    /// Treat `today` as the current date for every relative lookup.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.pinned_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.pinned_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn resolve_date(&self, input: &str) -> Result<NaiveDate> {
        parse_day(input, self.today())
    }

    /// Missing or blank inputs mean today.
    fn resolve_optional(&self, input: Option<&str>) -> Result<NaiveDate> {
        match input.map(str::trim) {
            Some(s) if !s.is_empty() => self.resolve_date(s),
            _ => Ok(self.today()),
        }
    }

    // --- Day view & toggles ---

    pub fn day_view(&self, date: &str) -> Result<DayView> {
        let date = self.resolve_date(date)?;
        self.db.build_day_view(date)
    }

    pub fn today_view(&self) -> Result<DayView> {
        self.db.build_day_view(self.today())
    }

    pub fn toggle_exercise(
        &self,
        date: &str,
        exercise_id: i64,
        completed: bool,
        sets_completed: i64,
    ) -> Result<()> {
        let date = self.resolve_date(date)?;
        self.db
            .toggle_exercise(date, exercise_id, completed, sets_completed)
    }

    pub fn toggle_meal(&self, date: &str, meal_id: i64, completed: bool) -> Result<()> {
        let date = self.resolve_date(date)?;
        self.db.toggle_meal(date, meal_id, completed)
    }

    // --- Daily logs ---

    pub fn daily_log(&self, date: &str) -> Result<Option<DailyLog>> {
        let date = self.resolve_date(date)?;
        self.db.find_daily_log(date)
    }

    pub fn update_daily_log(&self, date: &str, update: &UpdateDailyLog) -> Result<DailyLog> {
        let date = self.resolve_date(date)?;
        self.db.update_daily_log(date, update)
    }

    // --- Streak & progress ---

    pub fn streak(&self) -> Result<Streak> {
        self.streak_as_of(self.today())
    }

    pub fn streak_as_of(&self, today: NaiveDate) -> Result<Streak> {
        let rule = self.streak_rule()?;
        let streak = self.db.activity_streak(today, rule)?;
        Ok(Streak { streak })
    }

    pub fn progress(&self, days: Option<i64>) -> Result<Vec<ProgressPoint>> {
        self.db
            .progress(self.today(), days.unwrap_or(DEFAULT_PROGRESS_DAYS))
    }

    pub fn progress_summary(&self, days: Option<i64>) -> Result<ProgressSummary> {
        self.db
            .progress_summary(self.today(), days.unwrap_or(DEFAULT_PROGRESS_DAYS))
    }

    pub fn weight_history(&self, limit: Option<i64>) -> Result<Vec<WeightPoint>> {
        self.db
            .weight_history(limit.unwrap_or(DEFAULT_WEIGHT_HISTORY_LIMIT))
    }

    /// Active days for a month, or a whole year when `month` is `None`.
    /// `year` defaults to the current year.
    pub fn activity_calendar(&self, year: Option<i32>, month: Option<u32>) -> Result<Vec<ActiveDay>> {
        let year = year.unwrap_or_else(|| self.today().year());
        self.db.activity_calendar(year, month)
    }

    // --- Templates ---

    pub fn workouts(&self) -> Result<Vec<WorkoutTemplate>> {
        self.db.list_workouts()
    }

    pub fn exercises_for_day(&self, day_of_week: u32) -> Result<Vec<ExerciseTemplate>> {
        if day_of_week > 6 {
            return Err(Error::validation(
                "day_of_week must be between 0 (Sunday) and 6 (Saturday)",
            ));
        }
        self.db.exercises_for_day(day_of_week)
    }

    pub fn add_exercise(&self, exercise: &NewExercise) -> Result<ExerciseTemplate> {
        self.db.insert_exercise(exercise)
    }

    pub fn update_exercise(&self, id: i64, exercise: &NewExercise) -> Result<ExerciseTemplate> {
        self.db.update_exercise(id, exercise)
    }

    pub fn delete_exercise(&self, id: i64) -> Result<()> {
        self.db.delete_exercise(id)
    }

    pub fn meals(&self) -> Result<Vec<MealTemplate>> {
        self.db.list_meals()
    }

    pub fn add_meal(&self, meal: &NewMeal) -> Result<MealTemplate> {
        self.db.insert_meal(meal)
    }

    pub fn update_meal(&self, id: i64, meal: &NewMeal) -> Result<MealTemplate> {
        self.db.update_meal(id, meal)
    }

    pub fn delete_meal(&self, id: i64) -> Result<()> {
        self.db.delete_meal(id)
    }

    // --- Personal records ---

    pub fn personal_records(&self) -> Result<Vec<PersonalRecord>> {
        self.db.list_personal_records()
    }

    pub fn add_personal_record(&self, record: &NewPersonalRecord) -> Result<PersonalRecord> {
        let date = self.resolve_optional(record.record_date.as_deref())?;
        let saved = self.db.insert_personal_record(date, record)?;
        tracing::info!(exercise = %saved.exercise_name, "personal record saved");
        Ok(saved)
    }

    pub fn best_personal_record(&self, exercise_name: &str) -> Result<Option<PersonalRecord>> {
        self.db.best_personal_record(exercise_name)
    }

    pub fn best_personal_records(&self) -> Result<Vec<PersonalRecord>> {
        self.db.best_personal_records()
    }

    // --- Body measurements ---

    pub fn measurements(&self) -> Result<Vec<BodyMeasurement>> {
        self.db.list_measurements()
    }

    pub fn latest_measurement(&self) -> Result<Option<BodyMeasurement>> {
        self.db.latest_measurement()
    }

    pub fn save_measurement(&self, measurement: &NewMeasurement) -> Result<BodyMeasurement> {
        let date = self.resolve_optional(measurement.measure_date.as_deref())?;
        self.db.upsert_measurement(date, measurement)
    }

    // --- Goals ---

    pub fn goals(&self) -> Result<Vec<Goal>> {
        self.db.list_goals()
    }

    pub fn add_goal(&self, goal: &NewGoal) -> Result<Goal> {
        let target_date = match goal.target_date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(self.resolve_date(s)?),
            _ => None,
        };
        self.db.insert_goal(goal, target_date)
    }

    pub fn update_goal(&self, id: i64, update: &UpdateGoal) -> Result<Goal> {
        self.db.update_goal(id, update, self.today())
    }

    pub fn delete_goal(&self, id: i64) -> Result<()> {
        self.db.delete_goal(id)
    }

    // --- Achievements ---

    /// Every badge, after unlocking whatever the current data has earned.
    pub fn achievements(&self) -> Result<Vec<Achievement>> {
        self.db.evaluate_achievements(self.today())?;
        self.db.list_achievements()
    }

    pub fn unlock_achievement(&self, badge_id: &str) -> Result<Achievement> {
        let badge_id = badge_id.trim();
        if badge_id.is_empty() {
            return Err(Error::validation("badge_id must not be empty"));
        }
        self.db.unlock_achievement(badge_id, self.today())
    }

    // --- Workout sessions & sets ---

    pub fn workout_history(&self, limit: Option<i64>) -> Result<Vec<WorkoutSession>> {
        self.db
            .workout_history(limit.unwrap_or(DEFAULT_WORKOUT_HISTORY_LIMIT))
    }

    pub fn log_workout_session(&self, session: &NewWorkoutSession) -> Result<WorkoutSession> {
        let date = self.resolve_optional(session.session_date.as_deref())?;
        self.db.insert_workout_session(date, session)
    }

    pub fn exercise_sets(&self, date: &str, exercise_id: i64) -> Result<Vec<ExerciseSet>> {
        let date = self.resolve_date(date)?;
        self.db.exercise_sets(date, exercise_id)
    }

    pub fn log_exercise_set(&self, set: &NewExerciseSet) -> Result<ExerciseSet> {
        let date = self.resolve_date(&set.date)?;
        self.db.upsert_exercise_set(date, set)
    }

    // --- Settings ---

    pub fn settings(&self) -> Result<BTreeMap<String, String>> {
        self.db.list_settings()
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::validation("Setting key must not be empty"));
        }
        if key == STREAK_RULE_SETTING {
            return self.set_streak_rule(value.parse()?);
        }
        self.db.set_setting(key, value)
    }

    pub fn streak_rule(&self) -> Result<StreakRule> {
        let Some(value) = self.db.get_setting(STREAK_RULE_SETTING)? else {
            return Ok(StreakRule::default());
        };
        Ok(value.parse().unwrap_or_else(|_| {
            tracing::warn!(%value, "ignoring unrecognised streak rule setting");
            StreakRule::default()
        }))
    }

    pub fn set_streak_rule(&self, rule: StreakRule) -> Result<()> {
        self.db.set_setting(STREAK_RULE_SETTING, rule.as_str())
    }

    // --- Export / reset ---

    pub fn export_all(&self) -> Result<ExportData> {
        self.db.export_all()
    }

    pub fn reset_all(&self) -> Result<()> {
        self.db.reset_all()
    }
}
