pub mod exercise;
pub mod lenient;
pub mod user;

pub use exercise::*;
pub use user::*;
