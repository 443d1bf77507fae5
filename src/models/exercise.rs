use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exercises the pose service can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exercise {
    Pushup,
    Plank,
    Twist,
}

impl Exercise {
    pub const ALL: [Exercise; 3] = [Exercise::Pushup, Exercise::Plank, Exercise::Twist];

    /// Path segment on the pose service and `workout_name` in the history.
    pub fn as_str(&self) -> &'static str {
        match self {
            Exercise::Pushup => "pushup",
            Exercise::Plank => "plank",
            Exercise::Twist => "twist",
        }
    }

    /// Timed exercises accumulate hold time instead of counting reps.
    pub fn is_timed(&self) -> bool {
        matches!(self, Exercise::Plank)
    }

    /// Feedback fragment meaning the hold is currently correct.
    pub fn hold_marker(&self) -> Option<&'static str> {
        match self {
            Exercise::Plank => Some("good plank"),
            _ => None,
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pushup" | "pushups" | "push-up" => Ok(Exercise::Pushup),
            "plank" => Ok(Exercise::Plank),
            "twist" | "twists" => Ok(Exercise::Twist),
            other => Err(format!("Unknown exercise: {}. Supported: pushup, plank, twist", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exercise() {
        assert_eq!("Pushups".parse::<Exercise>().unwrap(), Exercise::Pushup);
        assert_eq!("plank".parse::<Exercise>().unwrap(), Exercise::Plank);
        assert!("squat".parse::<Exercise>().is_err());
    }

    #[test]
    fn test_only_plank_is_timed() {
        let timed: Vec<Exercise> = Exercise::ALL.into_iter().filter(Exercise::is_timed).collect();
        assert_eq!(timed, vec![Exercise::Plank]);
        assert_eq!(Exercise::Plank.hold_marker(), Some("good plank"));
    }
}
