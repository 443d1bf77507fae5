use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;
use crate::{database::MongoDB, services::workout_service};
use crate::services::workout_service::{
    DailyWorkoutsResponse, LogWorkoutRequest, WorkoutHistoryResponse, WorkoutLoggedResponse,
    WorkoutSummaryResponse, WorkoutTotalsResponse,
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct DailyQuery {
    pub email: Option<String>,
    /// Day as YYYY-MM-DD (UTC)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct HistoryQuery {
    pub email: Option<String>,
    /// First day included (YYYY-MM-DD)
    pub from: Option<String>,
    /// Last day included (YYYY-MM-DD)
    pub to: Option<String>,
}

/// POST /api/workouts - appends an end-of-session summary to the user's history
#[utoipa::path(
    post,
    path = "/api/workouts",
    tag = "Workouts",
    request_body = LogWorkoutRequest,
    responses(
        (status = 201, description = "Workout appended", body = WorkoutLoggedResponse),
        (status = 400, description = "Invalid workout"),
        (status = 404, description = "User not found")
    )
)]
pub async fn log_workout(
    db: web::Data<MongoDB>,
    request: web::Json<LogWorkoutRequest>,
) -> HttpResponse {
    log::info!(
        "🏋️ POST /api/workouts - email: {}, workout: {}",
        request.email.as_deref().unwrap_or("N/A"),
        request.workout_name.as_deref().unwrap_or("N/A")
    );

    match workout_service::log_workout(&db, &request).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) => {
            log::warn!("❌ Failed to log workout: {}", e);
            e.error_response()
        }
    }
}

/// GET /api/workouts - per-workout rep totals for one day
#[utoipa::path(
    get,
    path = "/api/workouts",
    tag = "Workouts",
    params(DailyQuery),
    responses(
        (status = 200, description = "Daily summary", body = DailyWorkoutsResponse),
        (status = 400, description = "Email and date are required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_workouts_on_date(
    db: web::Data<MongoDB>,
    query: web::Query<DailyQuery>,
) -> HttpResponse {
    log::info!("📅 GET /api/workouts - email: {:?}, date: {:?}", query.email, query.date);

    match workout_service::workouts_on_date(&db, query.email.as_deref(), query.date.as_deref()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Daily summary failed: {}", e);
            e.error_response()
        }
    }
}

/// GET /api/workout-summary - session count and active days
#[utoipa::path(
    get,
    path = "/api/workout-summary",
    tag = "Workouts",
    params(EmailQuery),
    responses(
        (status = 200, description = "Summary", body = WorkoutSummaryResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_workout_summary(
    db: web::Data<MongoDB>,
    query: web::Query<EmailQuery>,
) -> HttpResponse {
    log::info!("📊 GET /api/workout-summary - email: {:?}", query.email);

    match workout_service::workout_summary(&db, query.email.as_deref()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Workout summary failed: {}", e);
            e.error_response()
        }
    }
}

/// GET /api/workout-totals - lifetime reps per workout
#[utoipa::path(
    get,
    path = "/api/workout-totals",
    tag = "Workouts",
    params(EmailQuery),
    responses(
        (status = 200, description = "Totals per workout", body = WorkoutTotalsResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_workout_totals(
    db: web::Data<MongoDB>,
    query: web::Query<EmailQuery>,
) -> HttpResponse {
    log::info!("📊 GET /api/workout-totals - email: {:?}", query.email);

    match workout_service::workout_totals(&db, query.email.as_deref()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Workout totals error: {}", e);
            e.error_response()
        }
    }
}

/// GET /api/workouts/history - raw entries for the calendar view
#[utoipa::path(
    get,
    path = "/api/workouts/history",
    tag = "Workouts",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Entries, oldest first", body = WorkoutHistoryResponse),
        (status = 400, description = "Invalid range"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_workout_history(
    db: web::Data<MongoDB>,
    query: web::Query<HistoryQuery>,
) -> HttpResponse {
    log::info!(
        "🗓️ GET /api/workouts/history - email: {:?}, from: {:?}, to: {:?}",
        query.email, query.from, query.to
    );

    match workout_service::workout_history(
        &db,
        query.email.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )
    .await
    {
        Ok(response) => {
            log::info!("✅ Found {} workouts", response.workouts.len());
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Workout history failed: {}", e);
            e.error_response()
        }
    }
}
