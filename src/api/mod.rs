pub mod health;
pub mod metrics;
pub mod auth;
pub mod workouts;
pub mod swagger;

use actix_web::{error::InternalError, web, ResponseError};

use crate::utils::AppError;

/// Malformed JSON bodies answer with the same `{"message": ...}` shape as
/// every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = AppError::InvalidRequest(format!("Invalid request body: {}", err)).error_response();
        InternalError::from_response(err, response).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = AppError::InvalidRequest(format!("Invalid query: {}", err)).error_response();
        InternalError::from_response(err, response).into()
    })
}

/// Account and workout routes, with their extractor configuration.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(metrics::get_metrics))
        // Accounts
        .route("/signup", web::post().to(auth::signup))
        .route("/login", web::post().to(auth::login))
        .route("/account", web::delete().to(auth::delete_account))
        // Workout history
        .service(
            web::scope("/api")
                .route("/workouts/history", web::get().to(workouts::get_workout_history))
                .route("/workouts", web::post().to(workouts::log_workout))
                .route("/workouts", web::get().to(workouts::get_workouts_on_date))
                .route("/workout-summary", web::get().to(workouts::get_workout_summary))
                .route("/workout-totals", web::get().to(workouts::get_workout_totals)),
        );
}
