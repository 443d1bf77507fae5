pub mod api;
pub mod calendar;
pub mod client;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod services;
pub mod trainer;
pub mod utils;
