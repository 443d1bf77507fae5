//! Day-indexed views over a user's workout history.

pub mod days;
pub mod progress;

pub use days::{bucket_by_day, month_view, parse_month, streaks, CalendarDay, DayTotals, Intensity, MonthView, Streaks};
pub use progress::{MuscleGroupScores, ScoreBand, DEFAULT_MAX_SCORE, DEFAULT_TARGET_REPS};
