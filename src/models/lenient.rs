//! Number fields written by older clients come back as int32, int64, double
//! or null. These deserializers accept all of them.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_count(&self) -> i64 {
        match *self {
            Number::Int(n) => n,
            Number::Float(f) if f.is_finite() => f.round() as i64,
            Number::Float(_) => 0,
        }
    }

    fn as_seconds(&self) -> f64 {
        match *self {
            Number::Int(n) => n as f64,
            Number::Float(f) if f.is_finite() => f,
            Number::Float(_) => 0.0,
        }
    }
}

/// Rep count; null counts as 0.
pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(optional_count(deserializer)?.unwrap_or(0))
}

/// Duration in seconds; null counts as 0.
pub fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(optional_seconds(deserializer)?.unwrap_or(0.0))
}

pub fn optional_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<Number>::deserialize(deserializer)?.map(|n| n.as_count()))
}

pub fn optional_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Number>::deserialize(deserializer)?.map(|n| n.as_seconds()))
}
