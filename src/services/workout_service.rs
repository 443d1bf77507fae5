use crate::{
    database::MongoDB,
    models::{lenient, User, WorkoutEntry, WorkoutEntryResponse},
    utils::AppError,
};
use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::{doc, to_bson};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct LogWorkoutRequest {
    pub email: Option<String>,
    pub workout_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub reps: Option<i64>,
    #[serde(default, deserialize_with = "lenient::optional_seconds")]
    pub time_taken: Option<f64>,
    /// RFC 3339 timestamp; defaults to now
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorkoutLoggedResponse {
    pub message: String,
    pub entry: WorkoutEntryResponse,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct WorkoutTotal {
    pub workout_name: String,
    pub total_reps: i64,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DailyWorkoutsResponse {
    pub email: String,
    pub date: String,
    pub summary: Vec<WorkoutTotal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorkoutSummaryResponse {
    pub email: String,
    pub total_sessions: usize,
    pub active_days: usize,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorkoutTotalsResponse {
    pub email: String,
    pub totals: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorkoutHistoryResponse {
    pub email: String,
    pub workouts: Vec<WorkoutEntryResponse>,
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidRequest(message.to_string()))
}

pub fn parse_day(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT)
        .map_err(|_| AppError::InvalidRequest("Date must be formatted as YYYY-MM-DD".to_string()))
}

/// Validates a log request and turns it into the entry to append.
pub fn build_entry(request: &LogWorkoutRequest, now: DateTime<Utc>) -> Result<(String, WorkoutEntry), AppError> {
    let email = required(request.email.as_deref(), "Email and workout_name are required")?;
    let workout_name = required(request.workout_name.as_deref(), "Email and workout_name are required")?;

    let reps = request.reps.unwrap_or(0);
    if reps < 0 {
        return Err(AppError::InvalidRequest("reps must not be negative".to_string()));
    }

    let time_taken = request.time_taken.unwrap_or(0.0);
    if !time_taken.is_finite() || time_taken < 0.0 {
        return Err(AppError::InvalidRequest("time_taken must be a non-negative number".to_string()));
    }

    let date = match request.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|_| AppError::InvalidRequest("date must be an RFC 3339 timestamp".to_string()))?
            .with_timezone(&Utc),
        None => now,
    };

    Ok((email.to_string(), WorkoutEntry::new(workout_name, reps, time_taken, date)))
}

/// Sums reps per workout name for one day, keeping first-seen order.
pub fn summarize_day(entries: &[WorkoutEntry], day: NaiveDate) -> Vec<WorkoutTotal> {
    let mut summary: Vec<WorkoutTotal> = Vec::new();

    for entry in entries.iter().filter(|e| e.day() == day) {
        match summary.iter_mut().find(|t| t.workout_name == entry.workout_name) {
            Some(total) => total.total_reps += entry.reps,
            None => summary.push(WorkoutTotal {
                workout_name: entry.workout_name.clone(),
                total_reps: entry.reps,
            }),
        }
    }

    summary
}

/// Returns (total sessions, distinct active days).
pub fn session_stats(entries: &[WorkoutEntry]) -> (usize, usize) {
    let days: HashSet<NaiveDate> = entries.iter().map(WorkoutEntry::day).collect();
    (entries.len(), days.len())
}

pub fn totals_by_workout(entries: &[WorkoutEntry]) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.workout_name.clone()).or_insert(0) += entry.reps;
    }
    totals
}

/// Entries in the inclusive day range, oldest first.
pub fn history_in_range(
    entries: &[WorkoutEntry],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<WorkoutEntryResponse> {
    let mut selected: Vec<&WorkoutEntry> = entries
        .iter()
        .filter(|e| {
            let day = e.day();
            from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
        })
        .collect();

    selected.sort_by_key(|e| e.date);
    selected.into_iter().map(WorkoutEntryResponse::from).collect()
}

/// Per-day summary; `message` is set only when nothing was logged that day.
pub fn daily_response(email: &str, day: NaiveDate, entries: &[WorkoutEntry]) -> DailyWorkoutsResponse {
    let summary = summarize_day(entries, day);
    let message = summary.is_empty().then(|| "No workouts on this date".to_string());

    DailyWorkoutsResponse {
        email: email.to_string(),
        date: day.format(DAY_FORMAT).to_string(),
        summary,
        message,
    }
}

pub fn totals_response(email: &str, entries: &[WorkoutEntry]) -> WorkoutTotalsResponse {
    WorkoutTotalsResponse {
        email: email.to_string(),
        totals: totals_by_workout(entries),
        message: entries.is_empty().then(|| "No workouts found".to_string()),
    }
}

async fn find_user(db: &MongoDB, email: &str) -> Result<User, AppError> {
    db.users()
        .find_one(doc! { "email": email })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn log_workout(db: &MongoDB, request: &LogWorkoutRequest) -> Result<WorkoutLoggedResponse, AppError> {
    let (email, entry) = build_entry(request, Utc::now())?;

    let entry_bson = to_bson(&entry)
        .map_err(|e| AppError::DatabaseError(format!("Failed to encode workout: {}", e)))?;

    let result = db
        .users()
        .update_one(doc! { "email": &email }, doc! { "$push": { "workouts": entry_bson } })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    log::info!(
        "🏋️ Workout logged for {}: {} x{} ({:.1}s)",
        email, entry.workout_name, entry.reps, entry.time_taken
    );

    Ok(WorkoutLoggedResponse {
        message: "Workout logged".to_string(),
        entry: WorkoutEntryResponse::from(&entry),
    })
}

pub async fn workouts_on_date(
    db: &MongoDB,
    email: Option<&str>,
    date: Option<&str>,
) -> Result<DailyWorkoutsResponse, AppError> {
    let email = required(email, "Email and date are required")?;
    let raw_date = required(date, "Email and date are required")?;
    let day = parse_day(raw_date)?;

    let user = find_user(db, email).await?;
    Ok(daily_response(email, day, &user.workouts))
}

pub async fn workout_summary(db: &MongoDB, email: Option<&str>) -> Result<WorkoutSummaryResponse, AppError> {
    let email = required(email, "Email is required")?;
    let user = find_user(db, email).await?;

    let (total_sessions, active_days) = session_stats(&user.workouts);

    Ok(WorkoutSummaryResponse {
        email: email.to_string(),
        total_sessions,
        active_days,
    })
}

pub async fn workout_totals(db: &MongoDB, email: Option<&str>) -> Result<WorkoutTotalsResponse, AppError> {
    let email = required(email, "Email is required")?;
    let user = find_user(db, email).await?;
    Ok(totals_response(email, &user.workouts))
}

pub async fn workout_history(
    db: &MongoDB,
    email: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<WorkoutHistoryResponse, AppError> {
    let email = required(email, "Email is required")?;

    let from = from.filter(|v| !v.trim().is_empty()).map(parse_day).transpose()?;
    let to = to.filter(|v| !v.trim().is_empty()).map(parse_day).transpose()?;

    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(AppError::InvalidRequest("from must not be after to".to_string()));
        }
    }

    let user = find_user(db, email).await?;

    Ok(WorkoutHistoryResponse {
        email: email.to_string(),
        workouts: history_in_range(&user.workouts, from, to),
    })
}
