use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;

use crate::achievements::{self, BadgeStats};
use crate::catalog;
use crate::error::{Error, Result};
use crate::models::{
    Achievement, ActiveDay, BodyMeasurement, DATE_FORMAT, DailyLog, DayCompletion, DayView,
    ExerciseSet, ExerciseStatus, ExerciseTemplate, ExportData, ExportExerciseLog, ExportMealLog,
    Goal, MealItem, MealStatus, MealTemplate, NewExercise, NewExerciseSet, NewGoal, NewMeal,
    NewMeasurement, NewPersonalRecord, NewWorkoutSession, PersonalRecord, ProgressPoint,
    ProgressSummary, UpdateDailyLog, UpdateGoal, WeightPoint, WorkoutSession, WorkoutTemplate,
    date_key,
};
use crate::progress;
use crate::streak::{self, StreakRule};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const EXPORT_VERSION: i64 = 2;

// Columns expected by `exercise_from_row`.
const EXERCISE_SELECT: &str = "SELECT e.id, e.workout_id, w.day_of_week, e.name, e.sets, e.reps,
        e.category, e.order_index
     FROM exercises e
     JOIN workouts w ON w.id = e.workout_id";

const DAILY_LOG_COLUMNS: &str =
    "id, log_date, weight, water_intake, notes, created_at, updated_at";

const PERSONAL_RECORD_COLUMNS: &str =
    "id, exercise_name, weight, reps, record_date, notes, created_at";

const MEASUREMENT_COLUMNS: &str = "id, measure_date, chest, waist, hips, left_arm, right_arm,
    left_thigh, right_thigh, neck, shoulders, body_fat_percentage, notes, created_at, updated_at";

const GOAL_COLUMNS: &str = "id, goal_type, title, target_value, current_value, unit, target_date,
    completed, completed_date, created_at";

const ACHIEVEMENT_COLUMNS: &str =
    "badge_id, name, description, icon, unlocked, unlocked_date";

// Columns expected by `session_from_row`.
const SESSION_SELECT: &str = "SELECT s.id, s.session_date, s.workout_id, w.workout_type,
        w.muscle_groups, s.duration_minutes, s.total_volume, s.calories_burned, s.notes,
        s.rating, s.created_at
     FROM workout_sessions s
     LEFT JOIN workouts w ON w.id = s.workout_id";

// Columns expected by `exercise_set_from_row`.
const SET_SELECT: &str = "SELECT es.id, d.log_date, el.exercise_id, es.set_number, es.weight,
        es.reps, es.completed, es.notes
     FROM exercise_sets es
     JOIN exercise_logs el ON el.id = es.exercise_log_id
     JOIN daily_logs d ON d.id = el.daily_log_id";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Database { conn };
        db.migrate()?;
        db.seed_if_empty()?;
        db.seed_achievements()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            tracing::debug!("applying schema migration 1");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS workouts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    day_of_week INTEGER NOT NULL UNIQUE CHECK (day_of_week BETWEEN 0 AND 6),
                    day_name TEXT NOT NULL,
                    workout_type TEXT NOT NULL,
                    muscle_groups TEXT NOT NULL DEFAULT '[]',
                    is_rest_day INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS exercises (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    sets INTEGER NOT NULL CHECK (sets >= 1),
                    reps TEXT NOT NULL,
                    category TEXT NOT NULL,
                    order_index INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS meals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    time TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    items TEXT NOT NULL DEFAULT '[]',
                    order_index INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS daily_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    log_date TEXT NOT NULL UNIQUE,
                    weight REAL CHECK (weight IS NULL OR weight > 0),
                    water_intake INTEGER NOT NULL DEFAULT 0 CHECK (water_intake >= 0),
                    notes TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS exercise_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    daily_log_id INTEGER NOT NULL REFERENCES daily_logs(id) ON DELETE CASCADE,
                    exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
                    completed INTEGER NOT NULL DEFAULT 0,
                    sets_completed INTEGER NOT NULL DEFAULT 0 CHECK (sets_completed >= 0),
                    UNIQUE (daily_log_id, exercise_id)
                );

                CREATE TABLE IF NOT EXISTS meal_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    daily_log_id INTEGER NOT NULL REFERENCES daily_logs(id) ON DELETE CASCADE,
                    meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
                    completed INTEGER NOT NULL DEFAULT 0,
                    UNIQUE (daily_log_id, meal_id)
                );

                CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_exercises_workout ON exercises(workout_id, order_index);
                CREATE INDEX IF NOT EXISTS idx_exercise_logs_daily_log ON exercise_logs(daily_log_id);
                CREATE INDEX IF NOT EXISTS idx_meal_logs_daily_log ON meal_logs(daily_log_id);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            tracing::debug!("applying schema migration 2");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS personal_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    exercise_name TEXT NOT NULL,
                    weight REAL CHECK (weight IS NULL OR weight > 0),
                    reps INTEGER CHECK (reps IS NULL OR reps >= 1),
                    record_date TEXT NOT NULL,
                    notes TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS body_measurements (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    measure_date TEXT NOT NULL UNIQUE,
                    chest REAL,
                    waist REAL,
                    hips REAL,
                    left_arm REAL,
                    right_arm REAL,
                    left_thigh REAL,
                    right_thigh REAL,
                    neck REAL,
                    shoulders REAL,
                    body_fat_percentage REAL,
                    notes TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS goals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    goal_type TEXT NOT NULL,
                    title TEXT NOT NULL,
                    target_value REAL,
                    current_value REAL NOT NULL DEFAULT 0,
                    unit TEXT,
                    target_date TEXT,
                    completed INTEGER NOT NULL DEFAULT 0,
                    completed_date TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS achievements (
                    badge_id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    icon TEXT NOT NULL,
                    unlocked INTEGER NOT NULL DEFAULT 0,
                    unlocked_date TEXT
                );

                CREATE TABLE IF NOT EXISTS workout_sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_date TEXT NOT NULL,
                    workout_id INTEGER REFERENCES workouts(id) ON DELETE SET NULL,
                    duration_minutes INTEGER CHECK (duration_minutes IS NULL OR duration_minutes >= 0),
                    total_volume REAL NOT NULL DEFAULT 0,
                    calories_burned INTEGER NOT NULL DEFAULT 0,
                    notes TEXT NOT NULL DEFAULT '',
                    rating INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS exercise_sets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    exercise_log_id INTEGER NOT NULL REFERENCES exercise_logs(id) ON DELETE CASCADE,
                    set_number INTEGER NOT NULL CHECK (set_number >= 1),
                    weight REAL,
                    reps INTEGER,
                    completed INTEGER NOT NULL DEFAULT 0,
                    notes TEXT NOT NULL DEFAULT '',
                    UNIQUE (exercise_log_id, set_number)
                );

                CREATE INDEX IF NOT EXISTS idx_personal_records_name
                    ON personal_records(exercise_name COLLATE NOCASE);
                CREATE INDEX IF NOT EXISTS idx_workout_sessions_date ON workout_sessions(session_date);

                PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Seeding ---

    fn seed_if_empty(&self) -> Result<()> {
        let workouts: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM workouts", [], |row| row.get(0))?;
        if workouts > 0 {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        self.seed_catalog()?;
        tx.commit()?;
        Ok(())
    }

    /// Insert the built-in weekly plan. Callers own the transaction.
    #[allow(clippy::cast_possible_wrap)]
    fn seed_catalog(&self) -> Result<()> {
        for workout in catalog::WORKOUTS {
            let muscle_groups = serde_json::to_string(&unique_in_order(workout.muscle_groups))?;
            self.conn.execute(
                "INSERT INTO workouts (day_of_week, day_name, workout_type, muscle_groups, is_rest_day)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    workout.day_of_week,
                    workout.day_name,
                    workout.workout_type,
                    muscle_groups,
                    workout.is_rest_day,
                ],
            )?;
            let workout_id = self.conn.last_insert_rowid();
            for (index, exercise) in workout.exercises.iter().enumerate() {
                self.conn.execute(
                    "INSERT INTO exercises (workout_id, name, sets, reps, category, order_index)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        workout_id,
                        exercise.name,
                        exercise.sets,
                        exercise.reps,
                        exercise.category,
                        index as i64,
                    ],
                )?;
            }
        }

        for (index, meal) in catalog::MEALS.iter().enumerate() {
            let items: Vec<MealItem> = meal
                .items
                .iter()
                .map(|(name, quantity)| MealItem {
                    name: (*name).to_string(),
                    quantity: (*quantity).to_string(),
                })
                .collect();
            self.conn.execute(
                "INSERT INTO meals (name, time, meal_type, items, order_index)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    meal.name,
                    meal.time,
                    meal.meal_type,
                    serde_json::to_string(&items)?,
                    index as i64,
                ],
            )?;
        }

        tracing::info!(
            workouts = catalog::WORKOUTS.len(),
            meals = catalog::MEALS.len(),
            "seeded default workout and meal plan"
        );
        Ok(())
    }

    /// Insert any catalog badge not yet present. Existing rows keep their unlock state.
    fn seed_achievements(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        for badge in catalog::ACHIEVEMENTS {
            added += self.conn.execute(
                "INSERT OR IGNORE INTO achievements (badge_id, name, description, icon)
                 VALUES (?1, ?2, ?3, ?4)",
                params![badge.badge_id, badge.name, badge.description, badge.icon],
            )?;
        }
        tx.commit()?;
        if added > 0 {
            tracing::info!(badges = added, "seeded achievements");
        }
        Ok(())
    }

    // --- Row mapping helpers ---

    fn workout_from_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutTemplate> {
        Ok(WorkoutTemplate {
            id: row.get(0)?,
            day_of_week: row.get(1)?,
            day_name: row.get(2)?,
            workout_type: row.get(3)?,
            muscle_groups: json_column(row, 4)?,
            is_rest_day: row.get(5)?,
        })
    }

    fn exercise_from_row(row: &rusqlite::Row) -> rusqlite::Result<ExerciseTemplate> {
        Ok(ExerciseTemplate {
            id: row.get(0)?,
            workout_id: row.get(1)?,
            day_of_week: row.get(2)?,
            name: row.get(3)?,
            target_sets: row.get(4)?,
            target_reps: row.get(5)?,
            category: row.get(6)?,
            order_index: row.get(7)?,
        })
    }

    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealTemplate> {
        Ok(MealTemplate {
            id: row.get(0)?,
            name: row.get(1)?,
            time: row.get(2)?,
            meal_type: row.get(3)?,
            items: json_column(row, 4)?,
            order_index: row.get(5)?,
        })
    }

    fn daily_log_from_row(row: &rusqlite::Row) -> rusqlite::Result<DailyLog> {
        Ok(DailyLog {
            id: row.get(0)?,
            date: date_column(row, 1)?,
            weight: row.get(2)?,
            water_intake: row.get(3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn personal_record_from_row(row: &rusqlite::Row) -> rusqlite::Result<PersonalRecord> {
        Ok(PersonalRecord {
            id: row.get(0)?,
            exercise_name: row.get(1)?,
            weight: row.get(2)?,
            reps: row.get(3)?,
            record_date: date_column(row, 4)?,
            notes: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn measurement_from_row(row: &rusqlite::Row) -> rusqlite::Result<BodyMeasurement> {
        Ok(BodyMeasurement {
            id: row.get(0)?,
            measure_date: date_column(row, 1)?,
            chest: row.get(2)?,
            waist: row.get(3)?,
            hips: row.get(4)?,
            left_arm: row.get(5)?,
            right_arm: row.get(6)?,
            left_thigh: row.get(7)?,
            right_thigh: row.get(8)?,
            neck: row.get(9)?,
            shoulders: row.get(10)?,
            body_fat_percentage: row.get(11)?,
            notes: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    fn goal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
        Ok(Goal {
            id: row.get(0)?,
            goal_type: row.get(1)?,
            title: row.get(2)?,
            target_value: row.get(3)?,
            current_value: row.get(4)?,
            unit: row.get(5)?,
            target_date: opt_date_column(row, 6)?,
            completed: row.get(7)?,
            completed_date: opt_date_column(row, 8)?,
            created_at: row.get(9)?,
        })
    }

    fn achievement_from_row(row: &rusqlite::Row) -> rusqlite::Result<Achievement> {
        Ok(Achievement {
            badge_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            icon: row.get(3)?,
            unlocked: row.get(4)?,
            unlocked_date: opt_date_column(row, 5)?,
        })
    }

    fn session_from_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutSession> {
        // NULL when the session's workout was deleted
        let muscle_groups = match row.get::<_, Option<String>>(4)? {
            Some(_) => json_column(row, 4)?,
            None => Vec::new(),
        };
        Ok(WorkoutSession {
            id: row.get(0)?,
            session_date: date_column(row, 1)?,
            workout_id: row.get(2)?,
            workout_type: row.get(3)?,
            muscle_groups,
            duration_minutes: row.get(5)?,
            total_volume: row.get(6)?,
            calories_burned: row.get(7)?,
            notes: row.get(8)?,
            rating: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn exercise_set_from_row(row: &rusqlite::Row) -> rusqlite::Result<ExerciseSet> {
        Ok(ExerciseSet {
            id: row.get(0)?,
            date: row.get(1)?,
            exercise_id: row.get(2)?,
            set_number: row.get(3)?,
            weight: row.get(4)?,
            reps: row.get(5)?,
            completed: row.get(6)?,
            notes: row.get(7)?,
        })
    }

    fn ensure_exists(&self, table: &str, entity: &'static str, id: i64) -> Result<()> {
        let exists: bool = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
            params![id],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(Error::NotFound { entity, id })
        }
    }

    // --- Workouts & exercises ---

    pub fn list_workouts(&self) -> Result<Vec<WorkoutTemplate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, day_of_week, day_name, workout_type, muscle_groups, is_rest_day
             FROM workouts ORDER BY day_of_week",
        )?;
        let workouts = stmt
            .query_map([], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    pub fn workout_for_day(&self, day_of_week: u32) -> Result<Option<WorkoutTemplate>> {
        let workout = self
            .conn
            .query_row(
                "SELECT id, day_of_week, day_name, workout_type, muscle_groups, is_rest_day
                 FROM workouts WHERE day_of_week = ?1",
                params![day_of_week],
                Self::workout_from_row,
            )
            .optional()?;
        Ok(workout)
    }

    pub fn exercises_for_day(&self, day_of_week: u32) -> Result<Vec<ExerciseTemplate>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EXERCISE_SELECT} WHERE w.day_of_week = ?1 ORDER BY e.order_index, e.id"
        ))?;
        let exercises = stmt
            .query_map(params![day_of_week], Self::exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises)
    }

    pub fn list_exercises(&self) -> Result<Vec<ExerciseTemplate>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EXERCISE_SELECT} ORDER BY w.day_of_week, e.order_index, e.id"
        ))?;
        let exercises = stmt
            .query_map([], Self::exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exercises)
    }

    pub fn get_exercise(&self, id: i64) -> Result<ExerciseTemplate> {
        self.conn
            .query_row(
                &format!("{EXERCISE_SELECT} WHERE e.id = ?1"),
                params![id],
                Self::exercise_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound {
                entity: "Exercise",
                id,
            })
    }

    fn workout_id_for_day(&self, day_of_week: u32) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM workouts WHERE day_of_week = ?1",
                params![day_of_week],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound {
                entity: "Workout",
                id: i64::from(day_of_week),
            })
    }

    pub fn insert_exercise(&self, exercise: &NewExercise) -> Result<ExerciseTemplate> {
        exercise.validate()?;
        let workout_id = self.workout_id_for_day(exercise.day_of_week)?;
        self.conn.execute(
            "INSERT INTO exercises (workout_id, name, sets, reps, category, order_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                workout_id,
                exercise.name.trim(),
                exercise.target_sets,
                exercise.target_reps.trim(),
                exercise.category,
                exercise.order_index,
            ],
        )?;
        self.get_exercise(self.conn.last_insert_rowid())
    }

    pub fn update_exercise(&self, id: i64, exercise: &NewExercise) -> Result<ExerciseTemplate> {
        exercise.validate()?;
        let workout_id = self.workout_id_for_day(exercise.day_of_week)?;
        let rows = self.conn.execute(
            "UPDATE exercises
             SET workout_id = ?1, name = ?2, sets = ?3, reps = ?4, category = ?5, order_index = ?6
             WHERE id = ?7",
            params![
                workout_id,
                exercise.name.trim(),
                exercise.target_sets,
                exercise.target_reps.trim(),
                exercise.category,
                exercise.order_index,
                id,
            ],
        )?;
        if rows == 0 {
            return Err(Error::NotFound {
                entity: "Exercise",
                id,
            });
        }
        self.get_exercise(id)
    }

    /// Removes the template and, through the cascade, every completion recorded for it.
    pub fn delete_exercise(&self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM exercises WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(Error::NotFound {
                entity: "Exercise",
                id,
            });
        }
        Ok(())
    }

    // --- Meals ---

    pub fn list_meals(&self) -> Result<Vec<MealTemplate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, time, meal_type, items, order_index
             FROM meals ORDER BY order_index, id",
        )?;
        let meals = stmt
            .query_map([], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    pub fn get_meal(&self, id: i64) -> Result<MealTemplate> {
        self.conn
            .query_row(
                "SELECT id, name, time, meal_type, items, order_index FROM meals WHERE id = ?1",
                params![id],
                Self::meal_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound { entity: "Meal", id })
    }

    pub fn insert_meal(&self, meal: &NewMeal) -> Result<MealTemplate> {
        meal.validate()?;
        self.conn.execute(
            "INSERT INTO meals (name, time, meal_type, items, order_index)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                meal.name.trim(),
                meal.time.trim(),
                meal.meal_type,
                serde_json::to_string(&meal.items)?,
                meal.order_index,
            ],
        )?;
        self.get_meal(self.conn.last_insert_rowid())
    }

    pub fn update_meal(&self, id: i64, meal: &NewMeal) -> Result<MealTemplate> {
        meal.validate()?;
        let rows = self.conn.execute(
            "UPDATE meals SET name = ?1, time = ?2, meal_type = ?3, items = ?4, order_index = ?5
             WHERE id = ?6",
            params![
                meal.name.trim(),
                meal.time.trim(),
                meal.meal_type,
                serde_json::to_string(&meal.items)?,
                meal.order_index,
                id,
            ],
        )?;
        if rows == 0 {
            return Err(Error::NotFound { entity: "Meal", id });
        }
        self.get_meal(id)
    }

    pub fn delete_meal(&self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM meals WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(Error::NotFound { entity: "Meal", id });
        }
        Ok(())
    }

    // --- Daily logs ---

    /// Pure read: never creates a row.
    pub fn find_daily_log(&self, date: NaiveDate) -> Result<Option<DailyLog>> {
        let log = self
            .conn
            .query_row(
                &format!("SELECT {DAILY_LOG_COLUMNS} FROM daily_logs WHERE log_date = ?1"),
                params![date_key(date)],
                Self::daily_log_from_row,
            )
            .optional()?;
        Ok(log)
    }

    /// Return the log for `date`, inserting an empty one first if none exists.
    pub fn fetch_or_create_daily_log(&self, date: NaiveDate) -> Result<DailyLog> {
        let now = Local::now().to_rfc3339();
        let key = date_key(date);
        self.conn.execute(
            "INSERT INTO daily_logs (log_date, created_at, updated_at)
             VALUES (?1, ?2, ?2)
             ON CONFLICT(log_date) DO NOTHING",
            params![key, now],
        )?;
        let log = self.conn.query_row(
            &format!("SELECT {DAILY_LOG_COLUMNS} FROM daily_logs WHERE log_date = ?1"),
            params![key],
            Self::daily_log_from_row,
        )?;
        Ok(log)
    }

    pub fn update_daily_log(&self, date: NaiveDate, update: &UpdateDailyLog) -> Result<DailyLog> {
        update.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let log = self.fetch_or_create_daily_log(date)?;
        if update.is_empty() {
            tx.commit()?;
            return Ok(log);
        }

        let weight = update.weight.unwrap_or(log.weight);
        let water_intake = update.water_intake.unwrap_or(log.water_intake);
        let notes = update.notes.as_deref().unwrap_or(&log.notes);
        self.conn.execute(
            "UPDATE daily_logs SET weight = ?1, water_intake = ?2, notes = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                weight,
                water_intake,
                notes,
                Local::now().to_rfc3339(),
                log.id
            ],
        )?;
        let updated = self.conn.query_row(
            &format!("SELECT {DAILY_LOG_COLUMNS} FROM daily_logs WHERE id = ?1"),
            params![log.id],
            Self::daily_log_from_row,
        )?;
        tx.commit()?;
        Ok(updated)
    }

    // --- Completion toggles ---

    pub fn toggle_exercise(
        &self,
        date: NaiveDate,
        exercise_id: i64,
        completed: bool,
        sets_completed: i64,
    ) -> Result<()> {
        if sets_completed < 0 {
            return Err(Error::validation("sets_completed must not be negative"));
        }
        let tx = self.conn.unchecked_transaction()?;
        self.ensure_exists("exercises", "Exercise", exercise_id)?;
        let log = self.fetch_or_create_daily_log(date)?;
        self.conn.execute(
            "INSERT INTO exercise_logs (daily_log_id, exercise_id, completed, sets_completed)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(daily_log_id, exercise_id) DO UPDATE SET
                completed = excluded.completed,
                sets_completed = excluded.sets_completed",
            params![log.id, exercise_id, completed, sets_completed],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn toggle_meal(&self, date: NaiveDate, meal_id: i64, completed: bool) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.ensure_exists("meals", "Meal", meal_id)?;
        let log = self.fetch_or_create_daily_log(date)?;
        self.conn.execute(
            "INSERT INTO meal_logs (daily_log_id, meal_id, completed)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(daily_log_id, meal_id) DO UPDATE SET completed = excluded.completed",
            params![log.id, meal_id, completed],
        )?;
        tx.commit()?;
        Ok(())
    }

    // --- Day view ---

    pub fn build_day_view(&self, date: NaiveDate) -> Result<DayView> {
        let day_of_week = date.weekday().num_days_from_sunday();
        let workout = self.workout_for_day(day_of_week)?;
        let exercise_templates = match &workout {
            Some(w) if !w.is_rest_day => self.exercises_for_day(day_of_week)?,
            _ => Vec::new(),
        };
        let meal_templates = self.list_meals()?;
        let daily_log = self.fetch_or_create_daily_log(date)?;

        let mut stmt = self.conn.prepare(
            "SELECT exercise_id, completed, sets_completed FROM exercise_logs WHERE daily_log_id = ?1",
        )?;
        let exercise_marks: HashMap<i64, (bool, i64)> = stmt
            .query_map(params![daily_log.id], |row| {
                Ok((row.get(0)?, (row.get(1)?, row.get(2)?)))
            })?
            .collect::<Result<_, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT meal_id, completed FROM meal_logs WHERE daily_log_id = ?1")?;
        let meal_marks: HashMap<i64, bool> = stmt
            .query_map(params![daily_log.id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;

        let exercises: Vec<ExerciseStatus> = exercise_templates
            .into_iter()
            .map(|exercise| {
                let (completed, sets_completed) =
                    exercise_marks.get(&exercise.id).copied().unwrap_or_default();
                ExerciseStatus {
                    exercise,
                    completed,
                    sets_completed,
                }
            })
            .collect();

        let meals: Vec<MealStatus> = meal_templates
            .into_iter()
            .map(|meal| {
                let completed = meal_marks.get(&meal.id).copied().unwrap_or(false);
                MealStatus { meal, completed }
            })
            .collect();

        let completion = DayCompletion::from_statuses(&exercises, &meals);
        Ok(DayView {
            date: date_key(date),
            day_of_week,
            workout,
            exercises,
            meals,
            daily_log,
            completion,
        })
    }

    // --- Streak & progress ---

    /// Every logged date, newest first, flagged with whether anything was completed.
    pub fn activity_by_date(&self) -> Result<Vec<(NaiveDate, bool)>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.log_date,
                    EXISTS(SELECT 1 FROM exercise_logs el
                           WHERE el.daily_log_id = d.id AND el.completed = 1)
                    OR EXISTS(SELECT 1 FROM meal_logs ml
                              WHERE ml.daily_log_id = d.id AND ml.completed = 1)
             FROM daily_logs d
             ORDER BY d.log_date DESC",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((date_column(row, 0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn activity_streak(&self, today: NaiveDate, rule: StreakRule) -> Result<i64> {
        let logs = self.activity_by_date()?;
        Ok(streak::walk_streak(today, &logs, rule))
    }

    fn progress_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ProgressPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.log_date, d.weight, d.water_intake,
                    (SELECT COUNT(*) FROM exercise_logs el
                     WHERE el.daily_log_id = d.id AND el.completed = 1),
                    (SELECT COUNT(*) FROM meal_logs ml
                     WHERE ml.daily_log_id = d.id AND ml.completed = 1)
             FROM daily_logs d
             WHERE d.log_date >= ?1 AND d.log_date <= ?2
             ORDER BY d.log_date ASC",
        )?;
        let points = stmt
            .query_map(params![date_key(start), date_key(end)], |row| {
                Ok(ProgressPoint {
                    date: row.get(0)?,
                    weight: row.get(1)?,
                    water_intake: row.get(2)?,
                    exercises_completed: row.get(3)?,
                    meals_completed: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// One point per logged day in `[today - days, today]`, oldest first.
    pub fn progress(&self, today: NaiveDate, days: i64) -> Result<Vec<ProgressPoint>> {
        progress::validate_window(days)?;
        self.progress_between(progress::window_start(today, days), today)
    }

    pub fn progress_summary(&self, today: NaiveDate, days: i64) -> Result<ProgressSummary> {
        let points = self.progress(today, days)?;
        Ok(progress::summarize(days, &points))
    }

    /// Most recent `limit` weighed days, returned oldest first.
    pub fn weight_history(&self, limit: i64) -> Result<Vec<WeightPoint>> {
        if limit < 1 {
            return Err(Error::validation("limit must be at least 1"));
        }
        let mut stmt = self.conn.prepare(
            "SELECT log_date, weight FROM daily_logs
             WHERE weight IS NOT NULL
             ORDER BY log_date DESC
             LIMIT ?1",
        )?;
        let mut points = stmt
            .query_map(params![limit], |row| {
                Ok(WeightPoint {
                    date: row.get(0)?,
                    weight: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        points.reverse();
        Ok(points)
    }

    /// Days with at least one completion in a whole year, or one month of it.
    pub fn activity_calendar(&self, year: i32, month: Option<u32>) -> Result<Vec<ActiveDay>> {
        let (start, end) = calendar_range(year, month)?;
        let points = self.progress_between(start, end)?;
        Ok(points
            .into_iter()
            .filter(|p| p.exercises_completed + p.meals_completed > 0)
            .map(|p| ActiveDay {
                date: p.date,
                exercises_completed: p.exercises_completed,
                meals_completed: p.meals_completed,
            })
            .collect())
    }

    // --- Personal records ---

    pub fn insert_personal_record(
        &self,
        date: NaiveDate,
        record: &NewPersonalRecord,
    ) -> Result<PersonalRecord> {
        record.validate()?;
        self.conn.execute(
            "INSERT INTO personal_records (exercise_name, weight, reps, record_date, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.exercise_name.trim(),
                record.weight,
                record.reps,
                date_key(date),
                record.notes,
                Local::now().to_rfc3339(),
            ],
        )?;
        let record = self.conn.query_row(
            &format!("SELECT {PERSONAL_RECORD_COLUMNS} FROM personal_records WHERE id = ?1"),
            params![self.conn.last_insert_rowid()],
            Self::personal_record_from_row,
        )?;
        Ok(record)
    }

    /// Newest first.
    pub fn list_personal_records(&self) -> Result<Vec<PersonalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PERSONAL_RECORD_COLUMNS} FROM personal_records
             ORDER BY record_date DESC, id DESC"
        ))?;
        let records = stmt
            .query_map([], Self::personal_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Heaviest record for an exercise (name matched case-insensitively), reps breaking ties.
    pub fn best_personal_record(&self, exercise_name: &str) -> Result<Option<PersonalRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {PERSONAL_RECORD_COLUMNS} FROM personal_records
                     WHERE exercise_name = ?1 COLLATE NOCASE
                     ORDER BY weight DESC, reps DESC, record_date DESC
                     LIMIT 1"
                ),
                params![exercise_name.trim()],
                Self::personal_record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// The best record of every exercise, by exercise name.
    pub fn best_personal_records(&self) -> Result<Vec<PersonalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PERSONAL_RECORD_COLUMNS} FROM (
                SELECT *, ROW_NUMBER() OVER (
                    PARTITION BY lower(exercise_name)
                    ORDER BY weight DESC, reps DESC, record_date DESC
                ) AS rn
                FROM personal_records
             )
             WHERE rn = 1
             ORDER BY lower(exercise_name)"
        ))?;
        let records = stmt
            .query_map([], Self::personal_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    // --- Body measurements ---

    /// One row per date; a second save on the same date replaces every field.
    pub fn upsert_measurement(
        &self,
        date: NaiveDate,
        m: &NewMeasurement,
    ) -> Result<BodyMeasurement> {
        m.validate()?;
        let now = Local::now().to_rfc3339();
        let key = date_key(date);
        self.conn.execute(
            "INSERT INTO body_measurements (measure_date, chest, waist, hips, left_arm, right_arm,
                left_thigh, right_thigh, neck, shoulders, body_fat_percentage, notes,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
             ON CONFLICT(measure_date) DO UPDATE SET
                chest = excluded.chest,
                waist = excluded.waist,
                hips = excluded.hips,
                left_arm = excluded.left_arm,
                right_arm = excluded.right_arm,
                left_thigh = excluded.left_thigh,
                right_thigh = excluded.right_thigh,
                neck = excluded.neck,
                shoulders = excluded.shoulders,
                body_fat_percentage = excluded.body_fat_percentage,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![
                key,
                m.chest,
                m.waist,
                m.hips,
                m.left_arm,
                m.right_arm,
                m.left_thigh,
                m.right_thigh,
                m.neck,
                m.shoulders,
                m.body_fat_percentage,
                m.notes,
                now,
            ],
        )?;
        let measurement = self.conn.query_row(
            &format!("SELECT {MEASUREMENT_COLUMNS} FROM body_measurements WHERE measure_date = ?1"),
            params![key],
            Self::measurement_from_row,
        )?;
        Ok(measurement)
    }

    /// Newest first.
    pub fn list_measurements(&self) -> Result<Vec<BodyMeasurement>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM body_measurements ORDER BY measure_date DESC"
        ))?;
        let measurements = stmt
            .query_map([], Self::measurement_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(measurements)
    }

    pub fn latest_measurement(&self) -> Result<Option<BodyMeasurement>> {
        let measurement = self
            .conn
            .query_row(
                &format!(
                    "SELECT {MEASUREMENT_COLUMNS} FROM body_measurements
                     ORDER BY measure_date DESC LIMIT 1"
                ),
                [],
                Self::measurement_from_row,
            )
            .optional()?;
        Ok(measurement)
    }

    // --- Goals ---

    pub fn get_goal(&self, id: i64) -> Result<Goal> {
        self.conn
            .query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
                params![id],
                Self::goal_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound { entity: "Goal", id })
    }

    pub fn insert_goal(&self, goal: &NewGoal, target_date: Option<NaiveDate>) -> Result<Goal> {
        goal.validate()?;
        self.conn.execute(
            "INSERT INTO goals (goal_type, title, target_value, current_value, unit, target_date,
                created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                goal.goal_type.trim().to_lowercase(),
                goal.title.trim(),
                goal.target_value,
                goal.current_value,
                goal.unit,
                target_date.map(date_key),
                Local::now().to_rfc3339(),
            ],
        )?;
        self.get_goal(self.conn.last_insert_rowid())
    }

    /// Open goals first, each group by nearest target date; undated goals last.
    pub fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals
             ORDER BY completed ASC, target_date IS NULL, target_date ASC, id ASC"
        ))?;
        let goals = stmt
            .query_map([], Self::goal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Completing a goal stamps `today` unless it was already complete;
    /// reopening it clears the date.
    pub fn update_goal(&self, id: i64, update: &UpdateGoal, today: NaiveDate) -> Result<Goal> {
        if update.current_value.is_some_and(|v| !v.is_finite()) {
            return Err(Error::validation("current_value must be a finite number"));
        }
        let tx = self.conn.unchecked_transaction()?;
        let goal = self.get_goal(id)?;
        let current_value = update.current_value.unwrap_or(goal.current_value);
        let completed = update.completed.unwrap_or(goal.completed);
        let completed_date = if !completed {
            None
        } else if goal.completed {
            goal.completed_date.or(Some(today))
        } else {
            Some(today)
        };
        self.conn.execute(
            "UPDATE goals SET current_value = ?1, completed = ?2, completed_date = ?3 WHERE id = ?4",
            params![current_value, completed, completed_date.map(date_key), id],
        )?;
        let updated = self.get_goal(id)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn delete_goal(&self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM goals WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(Error::NotFound { entity: "Goal", id });
        }
        Ok(())
    }

    // --- Achievements ---

    /// Unlocked badges first, then alphabetical.
    pub fn list_achievements(&self) -> Result<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements ORDER BY unlocked DESC, name ASC"
        ))?;
        let badges = stmt
            .query_map([], Self::achievement_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(badges)
    }

    /// Unlocking is idempotent: the first unlock date is kept.
    pub fn unlock_achievement(&self, badge_id: &str, date: NaiveDate) -> Result<Achievement> {
        self.conn.execute(
            "UPDATE achievements SET unlocked = 1, unlocked_date = COALESCE(unlocked_date, ?2)
             WHERE badge_id = ?1",
            params![badge_id, date_key(date)],
        )?;
        self.conn
            .query_row(
                &format!("SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE badge_id = ?1"),
                params![badge_id],
                Self::achievement_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::UnknownKey {
                entity: "Achievement",
                key: badge_id.to_string(),
            })
    }

    fn dates(&self, sql: &str) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(sql)?;
        let dates = stmt
            .query_map([], |row| date_column(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dates)
    }

    fn badge_stats(&self) -> Result<BadgeStats> {
        let workout_days = self.dates(
            "SELECT DISTINCT d.log_date FROM daily_logs d
             JOIN exercise_logs el ON el.daily_log_id = d.id
             WHERE el.completed = 1",
        )?;
        let active_days = self
            .activity_by_date()?
            .into_iter()
            .filter_map(|(date, active)| active.then_some(date))
            .collect();
        let full_meal_days = self.dates(
            "SELECT d.log_date FROM daily_logs d
             WHERE (SELECT COUNT(*) FROM meals) > 0
               AND (SELECT COUNT(*) FROM meal_logs ml
                    WHERE ml.daily_log_id = d.id AND ml.completed = 1)
                   >= (SELECT COUNT(*) FROM meals)",
        )?;
        let max_water_intake = self.conn.query_row(
            "SELECT COALESCE(MAX(water_intake), 0) FROM daily_logs",
            [],
            |row| row.get(0),
        )?;
        let personal_records =
            self.conn
                .query_row("SELECT COUNT(*) FROM personal_records", [], |row| row.get(0))?;
        let completed_weight_goals = self.conn.query_row(
            "SELECT COUNT(*) FROM goals WHERE completed = 1 AND goal_type = 'weight'",
            [],
            |row| row.get(0),
        )?;
        Ok(BadgeStats {
            workout_days,
            active_days,
            full_meal_days,
            max_water_intake,
            personal_records,
            completed_weight_goals,
        })
    }

    /// Unlock every automatic badge the current data qualifies for.
    /// Returns the ids unlocked by this call.
    pub fn evaluate_achievements(&self, today: NaiveDate) -> Result<Vec<String>> {
        let stats = self.badge_stats()?;
        let tx = self.conn.unchecked_transaction()?;
        let mut unlocked = Vec::new();
        for badge_id in achievements::earned_badges(&stats) {
            let rows = self.conn.execute(
                "UPDATE achievements SET unlocked = 1, unlocked_date = ?2
                 WHERE badge_id = ?1 AND unlocked = 0",
                params![badge_id, date_key(today)],
            )?;
            if rows > 0 {
                unlocked.push(badge_id.to_string());
            }
        }
        tx.commit()?;
        if !unlocked.is_empty() {
            tracing::info!(badges = ?unlocked, "achievements unlocked");
        }
        Ok(unlocked)
    }

    // --- Workout sessions ---

    fn volume_on(&self, date: NaiveDate) -> Result<f64> {
        let volume = self.conn.query_row(
            "SELECT COALESCE(SUM(es.weight * es.reps), 0)
             FROM exercise_sets es
             JOIN exercise_logs el ON el.id = es.exercise_log_id
             JOIN daily_logs d ON d.id = el.daily_log_id
             WHERE d.log_date = ?1 AND es.completed = 1",
            params![date_key(date)],
            |row| row.get(0),
        )?;
        Ok(volume)
    }

    pub fn insert_workout_session(
        &self,
        date: NaiveDate,
        session: &NewWorkoutSession,
    ) -> Result<WorkoutSession> {
        session.validate()?;
        let workout_id = match session.workout_id {
            Some(id) => {
                self.ensure_exists("workouts", "Workout", id)?;
                Some(id)
            }
            None => self
                .workout_for_day(date.weekday().num_days_from_sunday())?
                .map(|w| w.id),
        };
        let total_volume = match session.total_volume {
            Some(v) => v,
            None => self.volume_on(date)?,
        };
        self.conn.execute(
            "INSERT INTO workout_sessions (session_date, workout_id, duration_minutes, total_volume,
                calories_burned, notes, rating, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                date_key(date),
                workout_id,
                session.duration_minutes,
                total_volume,
                session.calories_burned,
                session.notes,
                session.rating,
                Local::now().to_rfc3339(),
            ],
        )?;
        let session = self.conn.query_row(
            &format!("{SESSION_SELECT} WHERE s.id = ?1"),
            params![self.conn.last_insert_rowid()],
            Self::session_from_row,
        )?;
        Ok(session)
    }

    /// The `limit` most recent sessions, newest first.
    pub fn workout_history(&self, limit: i64) -> Result<Vec<WorkoutSession>> {
        if limit < 1 {
            return Err(Error::validation("limit must be at least 1"));
        }
        let mut stmt = self.conn.prepare(&format!(
            "{SESSION_SELECT} ORDER BY s.session_date DESC, s.id DESC LIMIT ?1"
        ))?;
        let sessions = stmt
            .query_map(params![limit], Self::session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    // --- Exercise sets ---

    /// Record one set of an exercise on `date`, replacing any set with the same number.
    /// The day's log and the exercise's log row are created as needed.
    pub fn upsert_exercise_set(&self, date: NaiveDate, set: &NewExerciseSet) -> Result<ExerciseSet> {
        set.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        self.ensure_exists("exercises", "Exercise", set.exercise_id)?;
        let log = self.fetch_or_create_daily_log(date)?;
        self.conn.execute(
            "INSERT INTO exercise_logs (daily_log_id, exercise_id)
             VALUES (?1, ?2)
             ON CONFLICT(daily_log_id, exercise_id) DO NOTHING",
            params![log.id, set.exercise_id],
        )?;
        let exercise_log_id: i64 = self.conn.query_row(
            "SELECT id FROM exercise_logs WHERE daily_log_id = ?1 AND exercise_id = ?2",
            params![log.id, set.exercise_id],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO exercise_sets (exercise_log_id, set_number, weight, reps, completed, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(exercise_log_id, set_number) DO UPDATE SET
                weight = excluded.weight,
                reps = excluded.reps,
                completed = excluded.completed,
                notes = excluded.notes",
            params![
                exercise_log_id,
                set.set_number,
                set.weight,
                set.reps,
                set.completed,
                set.notes,
            ],
        )?;
        let saved = self.conn.query_row(
            &format!("{SET_SELECT} WHERE es.exercise_log_id = ?1 AND es.set_number = ?2"),
            params![exercise_log_id, set.set_number],
            Self::exercise_set_from_row,
        )?;
        tx.commit()?;
        Ok(saved)
    }

    /// Pure read, ordered by set number.
    pub fn exercise_sets(&self, date: NaiveDate, exercise_id: i64) -> Result<Vec<ExerciseSet>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SET_SELECT} WHERE d.log_date = ?1 AND el.exercise_id = ?2 ORDER BY es.set_number"
        ))?;
        let sets = stmt
            .query_map(params![date_key(date), exercise_id], Self::exercise_set_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    // --- User Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO user_settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM user_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    pub fn list_settings(&self) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM user_settings ORDER BY key")?;
        let settings = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(settings)
    }

    // --- Export / reset ---

    fn all_daily_logs(&self) -> Result<Vec<DailyLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DAILY_LOG_COLUMNS} FROM daily_logs ORDER BY log_date"
        ))?;
        let logs = stmt
            .query_map([], Self::daily_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn all_workout_sessions(&self) -> Result<Vec<WorkoutSession>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SESSION_SELECT} ORDER BY s.session_date, s.id"))?;
        let sessions = stmt
            .query_map([], Self::session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    pub fn export_all(&self) -> Result<ExportData> {
        let mut stmt = self.conn.prepare(
            "SELECT d.log_date, el.exercise_id, el.completed, el.sets_completed
             FROM exercise_logs el
             JOIN daily_logs d ON d.id = el.daily_log_id
             ORDER BY d.log_date, el.exercise_id",
        )?;
        let exercise_logs = stmt
            .query_map([], |row| {
                Ok(ExportExerciseLog {
                    date: row.get(0)?,
                    exercise_id: row.get(1)?,
                    completed: row.get(2)?,
                    sets_completed: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT d.log_date, ml.meal_id, ml.completed
             FROM meal_logs ml
             JOIN daily_logs d ON d.id = ml.daily_log_id
             ORDER BY d.log_date, ml.meal_id",
        )?;
        let meal_logs = stmt
            .query_map([], |row| {
                Ok(ExportMealLog {
                    date: row.get(0)?,
                    meal_id: row.get(1)?,
                    completed: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(&format!(
            "{SET_SELECT} ORDER BY d.log_date, el.exercise_id, es.set_number"
        ))?;
        let exercise_sets = stmt
            .query_map([], Self::exercise_set_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            workouts: self.list_workouts()?,
            exercises: self.list_exercises()?,
            meals: self.list_meals()?,
            daily_logs: self.all_daily_logs()?,
            exercise_logs,
            meal_logs,
            personal_records: self.list_personal_records()?,
            body_measurements: self.list_measurements()?,
            goals: self.list_goals()?,
            achievements: self.list_achievements()?,
            workout_sessions: self.all_workout_sessions()?,
            exercise_sets,
            settings: self.list_settings()?,
        })
    }

    /// Delete every log, record and template, relock all badges, then reseed the
    /// default plan. Settings survive.
    pub fn reset_all(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute_batch(
            "DELETE FROM exercise_sets;
             DELETE FROM workout_sessions;
             DELETE FROM personal_records;
             DELETE FROM body_measurements;
             DELETE FROM goals;
             UPDATE achievements SET unlocked = 0, unlocked_date = NULL;
             DELETE FROM exercise_logs;
             DELETE FROM meal_logs;
             DELETE FROM daily_logs;
             DELETE FROM exercises;
             DELETE FROM meals;
             DELETE FROM workouts;",
        )?;
        self.seed_catalog()?;
        tx.commit()?;
        tracing::info!("all logs deleted and default plan restored");
        Ok(())
    }
}

fn unique_in_order(values: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.iter().any(|v| v == value) {
            out.push((*value).to_string());
        }
    }
    out
}

fn json_column<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn opt_date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        NaiveDate::parse_from_str(&t, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn calendar_range(year: i32, month: Option<u32>) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::validation(format!("Invalid calendar period {year}/{month:?}"));
    match month {
        Some(m) => {
            let start = NaiveDate::from_ymd_opt(year, m, 1).ok_or_else(invalid)?;
            let next = if m == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(year, m + 1, 1)
            }
            .ok_or_else(invalid)?;
            Ok((start, next - chrono::Duration::days(1)))
        }
        None => Ok((
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?,
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseCategory, MealKind};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // 2024-06-17 is a Monday, 2024-06-16 a Sunday.
    const MONDAY: &str = "2024-06-17";
    const SUNDAY: &str = "2024-06-16";

    fn first_exercise(db: &Database, day: u32) -> ExerciseTemplate {
        db.exercises_for_day(day).unwrap().remove(0)
    }

    fn first_meal(db: &Database) -> MealTemplate {
        db.list_meals().unwrap().remove(0)
    }

    fn log_count(db: &Database) -> i64 {
        db.conn
            .query_row("SELECT COUNT(*) FROM daily_logs", [], |row| row.get(0))
            .unwrap()
    }

    fn bench_record(weight: f64, reps: i64) -> NewPersonalRecord {
        NewPersonalRecord {
            exercise_name: "Flat BB Press".to_string(),
            weight: Some(weight),
            reps: Some(reps),
            record_date: None,
            notes: String::new(),
        }
    }

    fn waist(cm: f64) -> NewMeasurement {
        NewMeasurement {
            waist: Some(cm),
            ..NewMeasurement::default()
        }
    }

    fn weight_goal() -> NewGoal {
        NewGoal {
            goal_type: "weight".to_string(),
            title: "Reach 75 kg".to_string(),
            target_value: Some(75.0),
            current_value: 0.0,
            unit: Some("kg".to_string()),
            target_date: None,
        }
    }

    fn set_of(exercise_id: i64, set_number: i64, weight: f64, reps: i64) -> NewExerciseSet {
        NewExerciseSet {
            date: MONDAY.to_string(),
            exercise_id,
            set_number,
            weight: Some(weight),
            reps: Some(reps),
            completed: true,
            notes: String::new(),
        }
    }

    fn sample_exercise(day_of_week: u32) -> NewExercise {
        NewExercise {
            day_of_week,
            name: "Cable Crossover".to_string(),
            target_sets: 3,
            target_reps: "12".to_string(),
            category: ExerciseCategory::Chest,
            order_index: 99,
        }
    }

    #[test]
    fn test_seeds_default_plan() {
        let db = Database::open_in_memory().unwrap();
        let workouts = db.list_workouts().unwrap();
        assert_eq!(workouts.len(), 7);
        assert!(workouts[0].is_rest_day);
        assert_eq!(workouts[0].day_name, "Sunday");
        assert_eq!(workouts[1].workout_type, "Push Day (Incline)");
        assert_eq!(
            workouts[1].muscle_groups,
            vec!["Chest".to_string(), "Shoulder".to_string(), "Triceps".to_string()]
        );

        let monday = db.exercises_for_day(1).unwrap();
        assert_eq!(monday.len(), 10);
        assert_eq!(monday[0].name, "Incline Push Up");
        assert_eq!(monday[0].category, ExerciseCategory::Warmup);
        assert_eq!(monday[9].name, "Seated Dips");
        assert!(monday.windows(2).all(|w| w[0].order_index < w[1].order_index));

        let meals = db.list_meals().unwrap();
        assert_eq!(meals.len(), 8);
        assert_eq!(meals[0].name, "Pre-Workout");
        assert_eq!(meals[0].meal_type, MealKind::PreWorkout);
        assert_eq!(meals[0].items[1].name, "Dates");
        assert_eq!(meals[7].meal_type, MealKind::Night);
    }

    #[test]
    fn test_reopen_does_not_reseed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lift.db");
        let count = {
            let db = Database::open(&path).unwrap();
            db.list_exercises().unwrap().len()
        };
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_exercises().unwrap().len(), count);
        assert_eq!(db.list_workouts().unwrap().len(), 7);
    }

    #[test]
    fn test_find_daily_log_does_not_create() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.find_daily_log(date(MONDAY)).unwrap().is_none());
        assert_eq!(log_count(&db), 0);
    }

    #[test]
    fn test_fetch_or_create_is_unique_per_date() {
        let db = Database::open_in_memory().unwrap();
        let a = db.fetch_or_create_daily_log(date(MONDAY)).unwrap();
        let b = db.fetch_or_create_daily_log(date(MONDAY)).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.weight, None);
        assert_eq!(a.water_intake, 0);
        assert_eq!(a.notes, "");
        assert_eq!(log_count(&db), 1);
    }

    #[test]
    fn test_day_view_workout_day() {
        let db = Database::open_in_memory().unwrap();
        let view = db.build_day_view(date(MONDAY)).unwrap();
        assert_eq!(view.date, MONDAY);
        assert_eq!(view.day_of_week, 1);
        assert_eq!(view.workout.as_ref().unwrap().day_name, "Monday");
        assert_eq!(view.exercises.len(), 10);
        assert!(view.exercises.iter().all(|e| !e.completed && e.sets_completed == 0));
        assert_eq!(view.meals.len(), 8);
        assert_eq!(view.daily_log.date, date(MONDAY));
        assert_eq!(view.completion.exercises_total, 10);
        assert_eq!(view.completion.workout_pct, 0);
        assert_eq!(log_count(&db), 1);
    }

    #[test]
    fn test_day_view_rest_day_has_no_exercises() {
        let db = Database::open_in_memory().unwrap();
        let view = db.build_day_view(date(SUNDAY)).unwrap();
        assert_eq!(view.day_of_week, 0);
        assert!(view.workout.as_ref().unwrap().is_rest_day);
        assert!(view.exercises.is_empty());
        assert_eq!(view.meals.len(), 8);
    }

    #[test]
    fn test_day_view_rest_day_ignores_stray_exercise_completion() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        db.toggle_exercise(date(SUNDAY), exercise.id, true, 2).unwrap();
        let view = db.build_day_view(date(SUNDAY)).unwrap();
        assert!(view.exercises.is_empty());
        assert_eq!(view.completion.exercises_completed, 0);
    }

    #[test]
    fn test_day_view_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        db.toggle_exercise(date(MONDAY), exercise.id, true, 3).unwrap();
        let first = db.build_day_view(date(MONDAY)).unwrap();
        let second = db.build_day_view(date(MONDAY)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_toggle_reflects_in_day_view() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        let meal = first_meal(&db);
        db.toggle_exercise(date(MONDAY), exercise.id, true, 2).unwrap();
        db.toggle_meal(date(MONDAY), meal.id, true).unwrap();

        let view = db.build_day_view(date(MONDAY)).unwrap();
        let status = view
            .exercises
            .iter()
            .find(|e| e.exercise.id == exercise.id)
            .unwrap();
        assert!(status.completed);
        assert_eq!(status.sets_completed, 2);
        assert!(view.meals[0].completed);
        assert!(!view.meals[1].completed);
        assert_eq!(view.completion.exercises_completed, 1);
        assert_eq!(view.completion.workout_pct, 10);
        assert_eq!(view.completion.meals_completed, 1);
        assert_eq!(view.completion.diet_pct, 13);
    }

    #[test]
    fn test_toggle_upserts_single_row() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        db.toggle_exercise(date(MONDAY), exercise.id, true, 3).unwrap();
        db.toggle_exercise(date(MONDAY), exercise.id, false, 1).unwrap();

        let rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM exercise_logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);

        let view = db.build_day_view(date(MONDAY)).unwrap();
        let status = &view.exercises[0];
        assert!(!status.completed);
        assert_eq!(status.sets_completed, 1);
    }

    #[test]
    fn test_toggle_unknown_template_is_not_found_and_creates_nothing() {
        let db = Database::open_in_memory().unwrap();
        let err = db.toggle_exercise(date(MONDAY), 9999, true, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                entity: "Exercise",
                id: 9999
            }
        ));
        let err = db.toggle_meal(date(MONDAY), 9999, true).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Meal", .. }));
        assert_eq!(log_count(&db), 0);
    }

    #[test]
    fn test_toggle_rejects_negative_sets() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        let err = db
            .toggle_exercise(date(MONDAY), exercise.id, true, -1)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(log_count(&db), 0);
    }

    #[test]
    fn test_update_daily_log_partial() {
        let db = Database::open_in_memory().unwrap();
        let day = date(MONDAY);
        let log = db
            .update_daily_log(
                day,
                &UpdateDailyLog {
                    weight: Some(Some(81.2)),
                    notes: Some("felt strong".to_string()),
                    ..UpdateDailyLog::default()
                },
            )
            .unwrap();
        assert_eq!(log.weight, Some(81.2));
        assert_eq!(log.water_intake, 0);

        let log = db
            .update_daily_log(
                day,
                &UpdateDailyLog {
                    water_intake: Some(8),
                    ..UpdateDailyLog::default()
                },
            )
            .unwrap();
        assert_eq!(log.weight, Some(81.2));
        assert_eq!(log.water_intake, 8);
        assert_eq!(log.notes, "felt strong");

        let log = db
            .update_daily_log(
                day,
                &UpdateDailyLog {
                    weight: Some(None),
                    ..UpdateDailyLog::default()
                },
            )
            .unwrap();
        assert_eq!(log.weight, None);
        assert_eq!(log_count(&db), 1);
    }

    #[test]
    fn test_update_daily_log_validation() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_daily_log(
                date(MONDAY),
                &UpdateDailyLog {
                    water_intake: Some(-2),
                    ..UpdateDailyLog::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(log_count(&db), 0);
    }

    #[test]
    fn test_activity_streak_counts_consecutive_days() {
        let db = Database::open_in_memory().unwrap();
        let today = date("2024-06-20");
        let meal = first_meal(&db);
        for d in ["2024-06-20", "2024-06-19", "2024-06-18", "2024-06-16"] {
            db.toggle_meal(date(d), meal.id, true).unwrap();
        }
        assert_eq!(
            db.activity_streak(today, StreakRule::TodayExempt).unwrap(),
            3
        );
    }

    #[test]
    fn test_activity_streak_ignores_unchecked_rows() {
        let db = Database::open_in_memory().unwrap();
        let today = date("2024-06-20");
        let meal = first_meal(&db);
        db.toggle_meal(date("2024-06-19"), meal.id, true).unwrap();
        // visited today, completed then un-completed
        db.toggle_meal(today, meal.id, true).unwrap();
        db.toggle_meal(today, meal.id, false).unwrap();

        assert_eq!(
            db.activity_streak(today, StreakRule::TodayExempt).unwrap(),
            1
        );
        assert_eq!(db.activity_streak(today, StreakRule::Strict).unwrap(), 0);
    }

    #[test]
    fn test_activity_streak_empty() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(
            db.activity_streak(date(MONDAY), StreakRule::TodayExempt)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_progress_window_is_inclusive_and_ascending() {
        let db = Database::open_in_memory().unwrap();
        let today = date("2024-06-30");
        let exercise = first_exercise(&db, 1);
        let meal = first_meal(&db);
        // outside: 31 days ago and tomorrow
        db.fetch_or_create_daily_log(date("2024-05-30")).unwrap();
        db.fetch_or_create_daily_log(date("2024-07-01")).unwrap();
        // inside
        db.toggle_exercise(today, exercise.id, true, 3).unwrap();
        db.toggle_meal(today, meal.id, true).unwrap();
        db.update_daily_log(
            date("2024-05-31"),
            &UpdateDailyLog {
                weight: Some(Some(80.0)),
                water_intake: Some(5),
                ..UpdateDailyLog::default()
            },
        )
        .unwrap();

        let points = db.progress(today, 30).unwrap();
        let dates: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-05-31", "2024-06-30"]);
        assert_eq!(points[0].weight, Some(80.0));
        assert_eq!(points[0].water_intake, 5);
        assert_eq!(points[0].exercises_completed, 0);
        assert_eq!(points[1].exercises_completed, 1);
        assert_eq!(points[1].meals_completed, 1);
    }

    #[test]
    fn test_progress_seven_day_window_excludes_older_day() {
        let db = Database::open_in_memory().unwrap();
        let today = date("2024-06-30");
        let meals = db.list_meals().unwrap();
        // today - 8: one day past the window start
        db.toggle_meal(date("2024-06-22"), meals[0].id, true).unwrap();
        for (d, completed_meals) in [("2024-06-24", 1), ("2024-06-27", 2), ("2024-06-30", 3)] {
            for meal in &meals[..completed_meals] {
                db.toggle_meal(date(d), meal.id, true).unwrap();
            }
        }
        db.toggle_exercise(date("2024-06-24"), first_exercise(&db, 1).id, true, 3)
            .unwrap();

        let points = db.progress(today, 7).unwrap();
        let dates: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-24", "2024-06-27", "2024-06-30"]);
        let meal_counts: Vec<i64> = points.iter().map(|p| p.meals_completed).collect();
        assert_eq!(meal_counts, vec![1, 2, 3]);
        let exercise_counts: Vec<i64> = points.iter().map(|p| p.exercises_completed).collect();
        assert_eq!(exercise_counts, vec![1, 0, 0]);
    }

    #[test]
    fn test_progress_counts_only_completed_rows() {
        let db = Database::open_in_memory().unwrap();
        let today = date("2024-06-30");
        let meals = db.list_meals().unwrap();
        db.toggle_meal(today, meals[0].id, true).unwrap();
        db.toggle_meal(today, meals[1].id, false).unwrap();
        let points = db.progress(today, 7).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].meals_completed, 1);
    }

    #[test]
    fn test_progress_rejects_bad_window() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.progress(date(MONDAY), 0),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_progress_summary() {
        let db = Database::open_in_memory().unwrap();
        let today = date("2024-06-30");
        for (d, w) in [("2024-06-20", 82.0), ("2024-06-30", 80.5)] {
            db.update_daily_log(
                date(d),
                &UpdateDailyLog {
                    weight: Some(Some(w)),
                    water_intake: Some(6),
                    ..UpdateDailyLog::default()
                },
            )
            .unwrap();
        }
        let summary = db.progress_summary(today, 30).unwrap();
        assert_eq!(summary.days_logged, 2);
        assert_eq!(summary.active_days, 0);
        assert_eq!(summary.weight_change, Some(-1.5));
    }

    #[test]
    fn test_weight_history_limit_and_order() {
        let db = Database::open_in_memory().unwrap();
        for (d, w) in [
            ("2024-06-01", 80.0),
            ("2024-06-02", 79.8),
            ("2024-06-04", 79.5),
        ] {
            db.update_daily_log(
                date(d),
                &UpdateDailyLog {
                    weight: Some(Some(w)),
                    ..UpdateDailyLog::default()
                },
            )
            .unwrap();
        }
        // unweighed day is skipped
        db.fetch_or_create_daily_log(date("2024-06-03")).unwrap();

        let history = db.weight_history(2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "2024-06-02");
        assert_eq!(history[1].date, "2024-06-04");
        assert!(db.weight_history(0).is_err());
    }

    #[test]
    fn test_activity_calendar_month() {
        let db = Database::open_in_memory().unwrap();
        let meal = first_meal(&db);
        db.toggle_meal(date("2024-05-31"), meal.id, true).unwrap();
        db.toggle_meal(date("2024-06-01"), meal.id, true).unwrap();
        db.toggle_meal(date("2024-06-02"), meal.id, false).unwrap();
        db.toggle_meal(date("2024-06-30"), meal.id, true).unwrap();

        let june = db.activity_calendar(2024, Some(6)).unwrap();
        let dates: Vec<&str> = june.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-01", "2024-06-30"]);

        let year = db.activity_calendar(2024, None).unwrap();
        assert_eq!(year.len(), 3);

        assert!(db.activity_calendar(2024, Some(13)).is_err());
    }

    #[test]
    fn test_settings_crud() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_setting("streak_rule").unwrap(), None);
        db.set_setting("streak_rule", "strict").unwrap();
        db.set_setting("streak_rule", "today_exempt").unwrap();
        assert_eq!(
            db.get_setting("streak_rule").unwrap().as_deref(),
            Some("today_exempt")
        );
        assert_eq!(db.list_settings().unwrap().len(), 1);
        assert!(db.delete_setting("streak_rule").unwrap());
        assert!(!db.delete_setting("streak_rule").unwrap());
    }

    #[test]
    fn test_exercise_crud() {
        let db = Database::open_in_memory().unwrap();
        let created = db.insert_exercise(&sample_exercise(4)).unwrap();
        assert_eq!(created.day_of_week, 4);
        assert_eq!(
            db.exercises_for_day(4).unwrap().last().unwrap().id,
            created.id
        );

        let mut changed = sample_exercise(2);
        changed.name = "Face Pull".to_string();
        changed.category = ExerciseCategory::Shoulder;
        let updated = db.update_exercise(created.id, &changed).unwrap();
        assert_eq!(updated.name, "Face Pull");
        assert_eq!(updated.day_of_week, 2);

        db.delete_exercise(created.id).unwrap();
        assert!(matches!(
            db.get_exercise(created.id),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            db.delete_exercise(created.id),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_insert_exercise_validates() {
        let db = Database::open_in_memory().unwrap();
        let mut bad = sample_exercise(1);
        bad.target_sets = 0;
        assert!(matches!(
            db.insert_exercise(&bad),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_delete_exercise_cascades_completions() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        db.toggle_exercise(date(MONDAY), exercise.id, true, 3).unwrap();
        db.delete_exercise(exercise.id).unwrap();
        let rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM exercise_logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_meal_crud() {
        let db = Database::open_in_memory().unwrap();
        let meal = db
            .insert_meal(&NewMeal {
                name: "Mid-Morning".to_string(),
                time: "11:00 AM".to_string(),
                meal_type: MealKind::Snack,
                items: vec![MealItem {
                    name: "Greek Yogurt".to_string(),
                    quantity: "1 cup".to_string(),
                }],
                order_index: 3,
            })
            .unwrap();
        assert_eq!(meal.items.len(), 1);
        assert_eq!(db.list_meals().unwrap().len(), 9);

        let updated = db
            .update_meal(
                meal.id,
                &NewMeal {
                    name: "Mid-Morning".to_string(),
                    time: "11:30 AM".to_string(),
                    meal_type: MealKind::Snack,
                    items: Vec::new(),
                    order_index: 3,
                },
            )
            .unwrap();
        assert_eq!(updated.time, "11:30 AM");
        assert!(updated.items.is_empty());

        db.delete_meal(meal.id).unwrap();
        assert!(matches!(db.get_meal(meal.id), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_export_all() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        let meal = first_meal(&db);
        db.toggle_exercise(date(MONDAY), exercise.id, true, 3).unwrap();
        db.toggle_meal(date(MONDAY), meal.id, true).unwrap();
        db.set_setting("streak_rule", "strict").unwrap();

        db.insert_personal_record(date(MONDAY), &bench_record(100.0, 5))
            .unwrap();
        db.upsert_measurement(date(MONDAY), &waist(84.0)).unwrap();
        db.insert_goal(&weight_goal(), None).unwrap();
        db.upsert_exercise_set(date(MONDAY), &set_of(exercise.id, 1, 60.0, 10))
            .unwrap();
        db.insert_workout_session(date(MONDAY), &NewWorkoutSession::default())
            .unwrap();

        let data = db.export_all().unwrap();
        assert_eq!(data.version, 2);
        assert_eq!(data.personal_records.len(), 1);
        assert_eq!(data.body_measurements.len(), 1);
        assert_eq!(data.goals.len(), 1);
        assert_eq!(data.achievements.len(), catalog::ACHIEVEMENTS.len());
        assert_eq!(data.workout_sessions.len(), 1);
        assert_eq!(data.exercise_sets.len(), 1);
        assert_eq!(data.exercise_sets[0].date, MONDAY);
        assert_eq!(data.workouts.len(), 7);
        assert_eq!(data.meals.len(), 8);
        assert_eq!(data.daily_logs.len(), 1);
        assert_eq!(data.exercise_logs.len(), 1);
        assert_eq!(data.exercise_logs[0].date, MONDAY);
        assert_eq!(data.exercise_logs[0].sets_completed, 3);
        assert_eq!(data.meal_logs.len(), 1);
        assert_eq!(data.settings.get("streak_rule").map(String::as_str), Some("strict"));
    }

    #[test]
    fn test_reset_all_restores_default_plan() {
        let db = Database::open_in_memory().unwrap();
        let meal = first_meal(&db);
        db.toggle_meal(date(MONDAY), meal.id, true).unwrap();
        db.insert_exercise(&sample_exercise(1)).unwrap();
        db.set_setting("streak_rule", "strict").unwrap();

        db.insert_personal_record(date(MONDAY), &bench_record(100.0, 5))
            .unwrap();
        db.upsert_measurement(date(MONDAY), &waist(84.0)).unwrap();
        db.insert_goal(&weight_goal(), None).unwrap();
        db.insert_workout_session(date(MONDAY), &NewWorkoutSession::default())
            .unwrap();
        db.unlock_achievement("iron_will", date(MONDAY)).unwrap();

        db.reset_all().unwrap();

        assert_eq!(log_count(&db), 0);
        assert!(db.list_personal_records().unwrap().is_empty());
        assert!(db.list_measurements().unwrap().is_empty());
        assert!(db.list_goals().unwrap().is_empty());
        assert!(db.workout_history(10).unwrap().is_empty());
        let badges = db.list_achievements().unwrap();
        assert_eq!(badges.len(), catalog::ACHIEVEMENTS.len());
        assert!(badges.iter().all(|b| !b.unlocked && b.unlocked_date.is_none()));
        assert_eq!(db.exercises_for_day(1).unwrap().len(), 10);
        assert_eq!(db.list_meals().unwrap().len(), 8);
        assert_eq!(db.list_workouts().unwrap().len(), 7);
        assert_eq!(
            db.get_setting("streak_rule").unwrap().as_deref(),
            Some("strict")
        );
    }

    #[test]
    fn test_personal_records_best_and_listing() {
        let db = Database::open_in_memory().unwrap();
        db.insert_personal_record(date("2024-06-01"), &bench_record(90.0, 8))
            .unwrap();
        db.insert_personal_record(date("2024-06-10"), &bench_record(100.0, 3))
            .unwrap();
        db.insert_personal_record(date("2024-06-12"), &bench_record(100.0, 5))
            .unwrap();
        let mut squat = bench_record(140.0, 5);
        squat.exercise_name = "BB Squats".to_string();
        db.insert_personal_record(date("2024-06-05"), &squat).unwrap();

        let all = db.list_personal_records().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].record_date, date("2024-06-12"));

        let best = db.best_personal_record("flat bb press").unwrap().unwrap();
        assert_eq!((best.weight, best.reps), (Some(100.0), Some(5)));
        assert!(db.best_personal_record("Deadlift").unwrap().is_none());

        let bests = db.best_personal_records().unwrap();
        let names: Vec<&str> = bests.iter().map(|r| r.exercise_name.as_str()).collect();
        assert_eq!(names, vec!["BB Squats", "Flat BB Press"]);
        assert_eq!(bests[1].reps, Some(5));
    }

    #[test]
    fn test_personal_record_validation() {
        let db = Database::open_in_memory().unwrap();
        let mut empty = bench_record(100.0, 5);
        empty.weight = None;
        empty.reps = None;
        assert!(matches!(
            db.insert_personal_record(date(MONDAY), &empty),
            Err(Error::Validation(_))
        ));
        let mut unnamed = bench_record(100.0, 5);
        unnamed.exercise_name = "  ".to_string();
        assert!(db.insert_personal_record(date(MONDAY), &unnamed).is_err());
    }

    #[test]
    fn test_measurement_upsert_replaces_same_date() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_measurement(date("2024-06-01"), &waist(86.0)).unwrap();
        let first = db
            .upsert_measurement(
                date("2024-06-08"),
                &NewMeasurement {
                    chest: Some(102.0),
                    waist: Some(85.0),
                    ..NewMeasurement::default()
                },
            )
            .unwrap();
        let replaced = db.upsert_measurement(date("2024-06-08"), &waist(84.5)).unwrap();
        assert_eq!(replaced.id, first.id);
        assert_eq!(replaced.waist, Some(84.5));
        assert_eq!(replaced.chest, None);

        let all = db.list_measurements().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].measure_date, date("2024-06-08"));
        assert_eq!(db.latest_measurement().unwrap().unwrap().id, first.id);
    }

    #[test]
    fn test_measurement_validation() {
        let db = Database::open_in_memory().unwrap();
        assert!(
            db.upsert_measurement(date(MONDAY), &NewMeasurement::default())
                .is_err()
        );
        assert!(db.upsert_measurement(date(MONDAY), &waist(-1.0)).is_err());
        let bad_fat = NewMeasurement {
            body_fat_percentage: Some(120.0),
            ..NewMeasurement::default()
        };
        assert!(db.upsert_measurement(date(MONDAY), &bad_fat).is_err());
        assert!(db.latest_measurement().unwrap().is_none());
    }

    #[test]
    fn test_goal_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let today = date("2024-06-20");
        let undated = db.insert_goal(&weight_goal(), None).unwrap();
        let mut soon = weight_goal();
        soon.title = "Bench 100".to_string();
        soon.goal_type = "Strength".to_string();
        let soon = db.insert_goal(&soon, Some(date("2024-07-01"))).unwrap();
        assert_eq!(soon.goal_type, "strength");
        assert_eq!(undated.current_value, 0.0);

        let order: Vec<i64> = db.list_goals().unwrap().iter().map(|g| g.id).collect();
        assert_eq!(order, vec![soon.id, undated.id]);

        let done = db
            .update_goal(
                soon.id,
                &UpdateGoal {
                    current_value: Some(100.0),
                    completed: Some(true),
                },
                today,
            )
            .unwrap();
        assert!(done.completed);
        assert_eq!(done.completed_date, Some(today));

        // a later progress update keeps the original completion date
        let again = db
            .update_goal(
                soon.id,
                &UpdateGoal {
                    current_value: Some(102.5),
                    completed: Some(true),
                },
                date("2024-06-25"),
            )
            .unwrap();
        assert_eq!(again.completed_date, Some(today));
        assert_eq!(again.current_value, 102.5);

        let order: Vec<i64> = db.list_goals().unwrap().iter().map(|g| g.id).collect();
        assert_eq!(order, vec![undated.id, soon.id]);

        let reopened = db
            .update_goal(
                soon.id,
                &UpdateGoal {
                    completed: Some(false),
                    ..UpdateGoal::default()
                },
                today,
            )
            .unwrap();
        assert!(!reopened.completed);
        assert_eq!(reopened.completed_date, None);

        db.delete_goal(soon.id).unwrap();
        assert!(matches!(
            db.delete_goal(soon.id),
            Err(Error::NotFound { entity: "Goal", .. })
        ));
        assert!(matches!(
            db.update_goal(soon.id, &UpdateGoal::default(), today),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_achievements_seeded_locked() {
        let db = Database::open_in_memory().unwrap();
        let badges = db.list_achievements().unwrap();
        assert_eq!(badges.len(), 12);
        assert!(badges.iter().all(|b| !b.unlocked));
        assert!(badges.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[test]
    fn test_manual_unlock_keeps_first_date() {
        let db = Database::open_in_memory().unwrap();
        let badge = db.unlock_achievement("early_bird", date("2024-06-01")).unwrap();
        assert!(badge.unlocked);
        let again = db.unlock_achievement("early_bird", date("2024-06-09")).unwrap();
        assert_eq!(again.unlocked_date, Some(date("2024-06-01")));
        assert_eq!(db.list_achievements().unwrap()[0].badge_id, "early_bird");

        assert!(matches!(
            db.unlock_achievement("moonwalk", date(MONDAY)),
            Err(Error::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_evaluate_achievements_unlocks_earned_badges_once() {
        let db = Database::open_in_memory().unwrap();
        let today = date("2024-06-20");
        assert!(db.evaluate_achievements(today).unwrap().is_empty());

        let exercise = first_exercise(&db, 1);
        db.toggle_exercise(date(MONDAY), exercise.id, true, 3).unwrap();
        db.update_daily_log(
            date(MONDAY),
            &UpdateDailyLog {
                water_intake: Some(10),
                ..UpdateDailyLog::default()
            },
        )
        .unwrap();
        db.insert_personal_record(date(MONDAY), &bench_record(100.0, 5))
            .unwrap();

        let unlocked = db.evaluate_achievements(today).unwrap();
        assert_eq!(unlocked, vec!["first_workout", "hydration_master", "pr_breaker"]);
        assert!(db.evaluate_achievements(date("2024-06-21")).unwrap().is_empty());

        let badges = db.list_achievements().unwrap();
        let first = badges.iter().find(|b| b.badge_id == "first_workout").unwrap();
        assert_eq!(first.unlocked_date, Some(today));
    }

    #[test]
    fn test_week_of_full_meal_days_earns_meal_prep_pro() {
        let db = Database::open_in_memory().unwrap();
        let meals = db.list_meals().unwrap();
        let start = date("2024-06-01");
        for offset in 0..7 {
            let day = start + chrono::Duration::days(offset);
            for meal in &meals {
                db.toggle_meal(day, meal.id, true).unwrap();
            }
        }
        let unlocked = db.evaluate_achievements(date("2024-06-07")).unwrap();
        assert_eq!(unlocked, vec!["streak_7", "meal_prep_pro"]);
    }

    #[test]
    fn test_completed_weight_goal_earns_badge() {
        let db = Database::open_in_memory().unwrap();
        let goal = db.insert_goal(&weight_goal(), None).unwrap();
        db.update_goal(
            goal.id,
            &UpdateGoal {
                completed: Some(true),
                ..UpdateGoal::default()
            },
            date(MONDAY),
        )
        .unwrap();
        assert_eq!(
            db.evaluate_achievements(date(MONDAY)).unwrap(),
            vec!["weight_goal"]
        );
    }

    #[test]
    fn test_exercise_sets_upsert_per_set_number() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        db.upsert_exercise_set(date(MONDAY), &set_of(exercise.id, 2, 60.0, 10))
            .unwrap();
        db.upsert_exercise_set(date(MONDAY), &set_of(exercise.id, 1, 50.0, 12))
            .unwrap();
        let redone = db
            .upsert_exercise_set(date(MONDAY), &set_of(exercise.id, 2, 62.5, 8))
            .unwrap();
        assert_eq!(redone.weight, Some(62.5));

        let sets = db.exercise_sets(date(MONDAY), exercise.id).unwrap();
        let numbers: Vec<i64> = sets.iter().map(|s| s.set_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(sets[1].reps, Some(8));

        // logging sets does not mark the exercise completed
        let view = db.build_day_view(date(MONDAY)).unwrap();
        assert!(!view.exercises[0].completed);
        // and a later toggle keeps the sets
        db.toggle_exercise(date(MONDAY), exercise.id, true, 2).unwrap();
        assert_eq!(db.exercise_sets(date(MONDAY), exercise.id).unwrap().len(), 2);
    }

    #[test]
    fn test_exercise_set_rejects_unknown_exercise_and_bad_number() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.upsert_exercise_set(date(MONDAY), &set_of(9999, 1, 60.0, 10)),
            Err(Error::NotFound { .. })
        ));
        assert_eq!(log_count(&db), 0);

        let exercise = first_exercise(&db, 1);
        assert!(matches!(
            db.upsert_exercise_set(date(MONDAY), &set_of(exercise.id, 0, 60.0, 10)),
            Err(Error::Validation(_))
        ));
        assert!(db.exercise_sets(date(MONDAY), exercise.id).unwrap().is_empty());
    }

    #[test]
    fn test_workout_session_defaults_from_plan_and_sets() {
        let db = Database::open_in_memory().unwrap();
        let exercise = first_exercise(&db, 1);
        db.upsert_exercise_set(date(MONDAY), &set_of(exercise.id, 1, 50.0, 10))
            .unwrap();
        db.upsert_exercise_set(date(MONDAY), &set_of(exercise.id, 2, 60.0, 8))
            .unwrap();
        let mut skipped = set_of(exercise.id, 3, 70.0, 5);
        skipped.completed = false;
        db.upsert_exercise_set(date(MONDAY), &skipped).unwrap();

        let session = db
            .insert_workout_session(
                date(MONDAY),
                &NewWorkoutSession {
                    duration_minutes: Some(55),
                    rating: Some(4),
                    ..NewWorkoutSession::default()
                },
            )
            .unwrap();
        assert_eq!(session.workout_type.as_deref(), Some("Push Day (Incline)"));
        assert_eq!(session.muscle_groups.len(), 3);
        assert!((session.total_volume - 980.0).abs() < 1e-9);

        let bad = NewWorkoutSession {
            rating: Some(6),
            ..NewWorkoutSession::default()
        };
        assert!(db.insert_workout_session(date(MONDAY), &bad).is_err());
        let unknown = NewWorkoutSession {
            workout_id: Some(9999),
            ..NewWorkoutSession::default()
        };
        assert!(matches!(
            db.insert_workout_session(date(MONDAY), &unknown),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_workout_history_newest_first_with_limit() {
        let db = Database::open_in_memory().unwrap();
        for d in ["2024-06-17", "2024-06-19", "2024-06-18"] {
            db.insert_workout_session(date(d), &NewWorkoutSession::default())
                .unwrap();
        }
        let history = db.workout_history(2).unwrap();
        let dates: Vec<NaiveDate> = history.iter().map(|s| s.session_date).collect();
        assert_eq!(dates, vec![date("2024-06-19"), date("2024-06-18")]);
        assert_eq!(history[0].workout_type.as_deref(), Some("Legs Day"));
        assert!(db.workout_history(0).is_err());
    }

    #[test]
    fn test_session_survives_workout_removal() {
        let db = Database::open_in_memory().unwrap();
        let session = db
            .insert_workout_session(date(MONDAY), &NewWorkoutSession::default())
            .unwrap();
        db.conn
            .execute(
                "DELETE FROM workouts WHERE id = ?1",
                params![session.workout_id],
            )
            .unwrap();
        let history = db.workout_history(5).unwrap();
        assert_eq!(history[0].workout_id, None);
        assert!(history[0].muscle_groups.is_empty());
    }

    #[test]
    fn test_unique_in_order() {
        assert_eq!(
            unique_in_order(&["Legs", "Abs", "Legs"]),
            vec!["Legs".to_string(), "Abs".to_string()]
        );
    }
}
