use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use lift_core::Error as CoreError;
use lift_core::models::{
    Achievement, ActiveDay, BodyMeasurement, DailyLog, DayView, ExerciseSet, ExerciseTemplate,
    ExportData, Goal, MealTemplate, NewExercise, NewExerciseSet, NewGoal, NewMeal, NewMeasurement,
    NewPersonalRecord, NewWorkoutSession, PersonalRecord, ProgressPoint, ProgressSummary, Streak,
    UpdateDailyLog, UpdateGoal, WeightPoint, WorkoutSession, WorkoutTemplate,
};
use lift_core::service::LiftService;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<LiftService>>,
    api_key: Option<String>,
}

impl AppState {
    fn service(&self) -> MutexGuard<'_, LiftService> {
        self.service.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct ExerciseToggleRequest {
    date: String,
    #[serde(alias = "exerciseId")]
    exercise_id: i64,
    completed: bool,
    #[serde(default, alias = "setsCompleted")]
    sets_completed: i64,
}

#[derive(Deserialize)]
struct MealToggleRequest {
    date: String,
    #[serde(alias = "mealId")]
    meal_id: i64,
    completed: bool,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[allow(clippy::option_option)]
struct UpdateDailyLogRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    weight: Option<Option<f64>>,
    #[serde(alias = "waterIntake")]
    water_intake: Option<i64>,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct DaysQuery {
    days: Option<i64>,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct CalendarQuery {
    year: Option<i32>,
    month: Option<u32>,
}

#[derive(Deserialize)]
struct ExerciseSetsQuery {
    date: String,
    #[serde(alias = "exerciseId")]
    exercise_id: i64,
}

#[derive(Deserialize)]
struct UnlockRequest {
    #[serde(alias = "badgeId")]
    badge_id: String,
}

#[derive(Deserialize)]
struct SettingRequest {
    value: serde_json::Value,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

const SUCCESS: SuccessResponse = SuccessResponse { success: true };

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unavailable,
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Storage temporarily unavailable, try again".to_string(),
            ),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDate(_) | CoreError::Validation(_) => {
                Self::BadRequest(err.to_string())
            }
            CoreError::NotFound { .. } | CoreError::UnknownKey { .. } => {
                Self::NotFound(err.to_string())
            }
            CoreError::StorageUnavailable(ref source) => {
                tracing::warn!("storage unavailable: {source}");
                Self::Unavailable
            }
            CoreError::Storage(_) | CoreError::Serialization(_) => Self::Internal(err.into()),
        }
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Day view & toggles ---

async fn get_today(State(state): State<AppState>) -> Result<Json<DayView>, ApiError> {
    Ok(Json(state.service().today_view()?))
}

async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DayView>, ApiError> {
    Ok(Json(state.service().day_view(&date)?))
}

async fn toggle_exercise(
    State(state): State<AppState>,
    Json(req): Json<ExerciseToggleRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.service().toggle_exercise(
        &req.date,
        req.exercise_id,
        req.completed,
        req.sets_completed,
    )?;
    Ok(Json(SUCCESS))
}

async fn toggle_meal(
    State(state): State<AppState>,
    Json(req): Json<MealToggleRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .service()
        .toggle_meal(&req.date, req.meal_id, req.completed)?;
    Ok(Json(SUCCESS))
}

async fn update_daily_log(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(req): Json<UpdateDailyLogRequest>,
) -> Result<Json<DailyLog>, ApiError> {
    let update = UpdateDailyLog {
        weight: req.weight,
        water_intake: req.water_intake,
        notes: req.notes,
    };
    Ok(Json(state.service().update_daily_log(&date, &update)?))
}

// --- Streak & progress ---

async fn get_streak(State(state): State<AppState>) -> Result<Json<Streak>, ApiError> {
    Ok(Json(state.service().streak()?))
}

async fn get_progress(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<ProgressPoint>>, ApiError> {
    Ok(Json(state.service().progress(query.days)?))
}

async fn get_progress_summary(
    State(state): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<ProgressSummary>, ApiError> {
    Ok(Json(state.service().progress_summary(query.days)?))
}

async fn get_weight_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<WeightPoint>>, ApiError> {
    Ok(Json(state.service().weight_history(query.limit)?))
}

async fn get_activity_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<ActiveDay>>, ApiError> {
    Ok(Json(
        state
            .service()
            .activity_calendar(query.year, query.month)?,
    ))
}

// --- Templates ---

async fn list_workouts(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkoutTemplate>>, ApiError> {
    Ok(Json(state.service().workouts()?))
}

async fn list_workout_exercises(
    State(state): State<AppState>,
    Path(day): Path<u32>,
) -> Result<Json<Vec<ExerciseTemplate>>, ApiError> {
    Ok(Json(state.service().exercises_for_day(day)?))
}

async fn create_exercise(
    State(state): State<AppState>,
    Json(req): Json<NewExercise>,
) -> Result<(StatusCode, Json<ExerciseTemplate>), ApiError> {
    let exercise = state.service().add_exercise(&req)?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

async fn update_exercise(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewExercise>,
) -> Result<Json<ExerciseTemplate>, ApiError> {
    Ok(Json(state.service().update_exercise(id, &req)?))
}

async fn delete_exercise(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service().delete_exercise(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_meals(State(state): State<AppState>) -> Result<Json<Vec<MealTemplate>>, ApiError> {
    Ok(Json(state.service().meals()?))
}

async fn create_meal(
    State(state): State<AppState>,
    Json(req): Json<NewMeal>,
) -> Result<(StatusCode, Json<MealTemplate>), ApiError> {
    let meal = state.service().add_meal(&req)?;
    Ok((StatusCode::CREATED, Json(meal)))
}

async fn update_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewMeal>,
) -> Result<Json<MealTemplate>, ApiError> {
    Ok(Json(state.service().update_meal(id, &req)?))
}

async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service().delete_meal(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Personal records ---

async fn list_personal_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonalRecord>>, ApiError> {
    Ok(Json(state.service().personal_records()?))
}

async fn create_personal_record(
    State(state): State<AppState>,
    Json(req): Json<NewPersonalRecord>,
) -> Result<(StatusCode, Json<PersonalRecord>), ApiError> {
    let record = state.service().add_personal_record(&req)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn best_personal_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonalRecord>>, ApiError> {
    Ok(Json(state.service().best_personal_records()?))
}

/// `null` when the exercise has no record yet.
async fn best_personal_record(
    State(state): State<AppState>,
    Path(exercise_name): Path<String>,
) -> Result<Json<Option<PersonalRecord>>, ApiError> {
    Ok(Json(state.service().best_personal_record(&exercise_name)?))
}

// --- Measurements & goals ---

async fn list_measurements(
    State(state): State<AppState>,
) -> Result<Json<Vec<BodyMeasurement>>, ApiError> {
    Ok(Json(state.service().measurements()?))
}

async fn latest_measurement(
    State(state): State<AppState>,
) -> Result<Json<Option<BodyMeasurement>>, ApiError> {
    Ok(Json(state.service().latest_measurement()?))
}

async fn save_measurement(
    State(state): State<AppState>,
    Json(req): Json<NewMeasurement>,
) -> Result<Json<BodyMeasurement>, ApiError> {
    Ok(Json(state.service().save_measurement(&req)?))
}

async fn list_goals(State(state): State<AppState>) -> Result<Json<Vec<Goal>>, ApiError> {
    Ok(Json(state.service().goals()?))
}

async fn create_goal(
    State(state): State<AppState>,
    Json(req): Json<NewGoal>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let goal = state.service().add_goal(&req)?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateGoal>,
) -> Result<Json<Goal>, ApiError> {
    Ok(Json(state.service().update_goal(id, &req)?))
}

async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service().delete_goal(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Achievements ---

async fn list_achievements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Achievement>>, ApiError> {
    Ok(Json(state.service().achievements()?))
}

async fn unlock_achievement(
    State(state): State<AppState>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<Achievement>, ApiError> {
    Ok(Json(state.service().unlock_achievement(&req.badge_id)?))
}

// --- Sessions & sets ---

async fn get_workout_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<WorkoutSession>>, ApiError> {
    Ok(Json(state.service().workout_history(query.limit)?))
}

async fn create_workout_session(
    State(state): State<AppState>,
    Json(req): Json<NewWorkoutSession>,
) -> Result<(StatusCode, Json<WorkoutSession>), ApiError> {
    let session = state.service().log_workout_session(&req)?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn list_exercise_sets(
    State(state): State<AppState>,
    Query(query): Query<ExerciseSetsQuery>,
) -> Result<Json<Vec<ExerciseSet>>, ApiError> {
    Ok(Json(
        state
            .service()
            .exercise_sets(&query.date, query.exercise_id)?,
    ))
}

async fn save_exercise_set(
    State(state): State<AppState>,
    Json(req): Json<NewExerciseSet>,
) -> Result<Json<ExerciseSet>, ApiError> {
    Ok(Json(state.service().log_exercise_set(&req)?))
}

// --- Settings, export, reset ---

async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    Ok(Json(state.service().settings()?))
}

async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SettingRequest>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let value = match req.value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    state.service().set_setting(&key, &value)?;
    Ok(Json(BTreeMap::from([(key, value)])))
}

async fn export_data(State(state): State<AppState>) -> Result<Json<ExportData>, ApiError> {
    Ok(Json(state.service().export_all()?))
}

async fn reset_data(State(state): State<AppState>) -> Result<Json<SuccessResponse>, ApiError> {
    state.service().reset_all()?;
    Ok(Json(SUCCESS))
}

// --- Router ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/today", get(get_today))
        .route("/api/day/{date}", get(get_day))
        .route("/api/exercise-toggle", post(toggle_exercise))
        .route("/api/meal-toggle", post(toggle_meal))
        .route("/api/daily-log/{date}", put(update_daily_log))
        .route("/api/streak", get(get_streak))
        .route("/api/progress", get(get_progress))
        .route("/api/progress/summary", get(get_progress_summary))
        .route("/api/weight-history", get(get_weight_history))
        .route("/api/activity-calendar", get(get_activity_calendar))
        .route("/api/workouts", get(list_workouts))
        .route("/api/workouts/{day}/exercises", get(list_workout_exercises))
        .route("/api/exercises", post(create_exercise))
        .route(
            "/api/exercises/{id}",
            put(update_exercise).delete(delete_exercise),
        )
        .route("/api/meals", get(list_meals).post(create_meal))
        .route("/api/meals/{id}", put(update_meal).delete(delete_meal))
        .route(
            "/api/personal-records",
            get(list_personal_records).post(create_personal_record),
        )
        .route("/api/personal-records/best", get(best_personal_records))
        .route(
            "/api/personal-records/{exercise_name}",
            get(best_personal_record),
        )
        .route(
            "/api/measurements",
            get(list_measurements).post(save_measurement),
        )
        .route("/api/measurements/latest", get(latest_measurement))
        .route("/api/goals", get(list_goals).post(create_goal))
        .route("/api/goals/{id}", put(update_goal).delete(delete_goal))
        .route("/api/achievements", get(list_achievements))
        .route("/api/achievements/unlock", post(unlock_achievement))
        .route("/api/workout-history", get(get_workout_history))
        .route("/api/workout-sessions", post(create_workout_session))
        .route(
            "/api/exercise-sets",
            get(list_exercise_sets).post(save_exercise_set),
        )
        .route("/api/settings", get(get_settings))
        .route("/api/settings/{key}", put(put_setting))
        .route("/api/export", get(export_data))
        .route("/api/reset", post(reset_data))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    service: LiftService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        if key.len() >= 8 && key.is_ascii() {
            eprintln!(
                "API key: {}...{} (see api_key file in data directory)",
                &key[..4],
                &key[key.len() - 4..],
            );
        }
    } else {
        tracing::warn!("authentication disabled (--no-auth), the API is open to anyone");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        tracing::warn!(
            "listening on {bind} with no authentication; any device on your network can access this API"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    tracing::info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
