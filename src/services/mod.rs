pub mod auth_service;
pub mod workout_service;
