use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use super::lenient;

/// Name of the single collection holding accounts and their workout history.
pub const USER_COLLECTION: &str = "user";

/// Maximum username length accepted at signup (in characters).
pub const MAX_USERNAME_LEN: usize = 10;

/// Account document. Workout history is embedded, never stored separately.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub workouts: Vec<WorkoutEntry>,
}

/// One logged exercise instance.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkoutEntry {
    pub workout_name: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub reps: i64,
    /// Seconds. Hold time for timed exercises, session length otherwise.
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub time_taken: f64,
    pub date: BsonDateTime,
}

impl WorkoutEntry {
    pub fn new(workout_name: impl Into<String>, reps: i64, time_taken: f64, date: DateTime<Utc>) -> Self {
        Self {
            workout_name: workout_name.into(),
            reps,
            time_taken,
            date: BsonDateTime::from_millis(date.timestamp_millis()),
        }
    }

    pub fn date_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.date.timestamp_millis()).unwrap_or_default()
    }

    /// Calendar day the entry falls on (UTC).
    pub fn day(&self) -> NaiveDate {
        self.date_utc().date_naive()
    }
}

/// Wire representation of a workout entry (dates as RFC 3339 strings).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct WorkoutEntryResponse {
    pub workout_name: String,
    pub reps: i64,
    pub time_taken: f64,
    pub date: String,
}

impl From<&WorkoutEntry> for WorkoutEntryResponse {
    fn from(entry: &WorkoutEntry) -> Self {
        WorkoutEntryResponse {
            workout_name: entry.workout_name.clone(),
            reps: entry.reps,
            time_taken: entry.time_taken,
            date: entry.date_utc().to_rfc3339(),
        }
    }
}

impl WorkoutEntryResponse {
    /// Converts back into the stored form. Unparsable dates are rejected.
    pub fn to_entry(&self) -> Result<WorkoutEntry, String> {
        let date = DateTime::parse_from_rfc3339(&self.date)
            .map_err(|e| format!("Invalid workout date {:?}: {}", self.date, e))?
            .with_timezone(&Utc);
        Ok(WorkoutEntry::new(self.workout_name.clone(), self.reps, self.time_taken, date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::bson::{doc, from_document, Bson};

    #[test]
    fn test_user_without_workouts_deserializes() {
        let document = doc! {
            "email": "ana@example.com",
            "password": "secret",
            "username": "ana",
        };
        let user: User = from_document(document).unwrap();
        assert!(user.workouts.is_empty());
        assert!(user.id.is_none());
    }

    #[test]
    fn test_entry_missing_reps_counts_as_zero() {
        let document = doc! {
            "workout_name": "plank",
            "time_taken": 42.5,
            "date": BsonDateTime::from_millis(0),
        };
        let entry: WorkoutEntry = from_document(document).unwrap();
        assert_eq!(entry.reps, 0);
        assert_eq!(entry.time_taken, 42.5);
    }

    #[test]
    fn test_legacy_number_types_decode() {
        let document = doc! {
            "email": "ana@example.com",
            "password": "secret",
            "workouts": [
                { "workout_name": "pushup", "reps": 12.0, "time_taken": 30, "date": BsonDateTime::from_millis(0) },
                { "workout_name": "twist", "reps": Bson::Null, "time_taken": Bson::Null, "date": BsonDateTime::from_millis(0) },
                { "workout_name": "pushup", "reps": 7_i64, "time_taken": 12.5, "date": BsonDateTime::from_millis(0) },
            ],
        };

        let user: User = from_document(document).unwrap();
        let reps: Vec<i64> = user.workouts.iter().map(|w| w.reps).collect();
        let times: Vec<f64> = user.workouts.iter().map(|w| w.time_taken).collect();
        assert_eq!(reps, vec![12, 0, 7]);
        assert_eq!(times, vec![30.0, 0.0, 12.5]);
    }

    #[test]
    fn test_entry_day_is_utc() {
        let late = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 59).unwrap();
        let entry = WorkoutEntry::new("pushup", 12, 30.0, late);
        assert_eq!(entry.day(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());

        let wire = WorkoutEntryResponse::from(&entry);
        assert_eq!(wire.date, "2025-03-09T23:59:59+00:00");
        assert_eq!(wire.to_entry().unwrap(), entry);
    }
}
