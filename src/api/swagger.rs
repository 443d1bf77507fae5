use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Exercia API - Accounts & Workout History",
        version = "1.0.0",
        description = "Account and workout-history API behind the Exercia training app.\n\n**Authentication:** none. Routes identify the user by email.\n\n**Features:**\n- Signup, login and account deletion\n- End-of-session workout logging\n- Daily, lifetime and calendar history views\n- Health monitoring and metrics"
    ),
    paths(
        // Auth endpoints
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::delete_account,

        // Workouts
        crate::api::workouts::log_workout,
        crate::api::workouts::get_workouts_on_date,
        crate::api::workouts::get_workout_summary,
        crate::api::workouts::get_workout_totals,
        crate::api::workouts::get_workout_history,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::LoginResponse,
            crate::services::auth_service::MessageResponse,

            // Workouts
            crate::models::WorkoutEntryResponse,
            crate::services::workout_service::LogWorkoutRequest,
            crate::services::workout_service::WorkoutLoggedResponse,
            crate::services::workout_service::WorkoutTotal,
            crate::services::workout_service::DailyWorkoutsResponse,
            crate::services::workout_service::WorkoutSummaryResponse,
            crate::services::workout_service::WorkoutTotalsResponse,
            crate::services::workout_service::WorkoutHistoryResponse,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Account creation, login and deletion."),
        (name = "Workouts", description = "Workout logging and history aggregation."),
        (name = "Health", description = "Health check and request metrics."),
    )
)]
pub struct ApiDoc;
