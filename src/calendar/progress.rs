use serde::Serialize;
use std::collections::BTreeMap;

/// Top of every muscle-group scale.
pub const DEFAULT_MAX_SCORE: f64 = 100.0;

/// Total reps of one exercise that fill its primary muscle group.
pub const DEFAULT_TARGET_REPS: i64 = 500;

/// Muscle-group weights per exercise: (chest, bicep, tricep, back, abs, glutes, leg).
const MUSCLE_TABLE: &[(&str, [f64; 7])] = &[
    ("pushup", [1.0, 0.2, 0.7, 0.2, 0.3, 0.0, 0.0]),
    ("plank", [0.2, 0.1, 0.2, 0.6, 1.0, 0.5, 0.3]),
    ("twist", [0.0, 0.0, 0.0, 0.4, 1.0, 0.2, 0.1]),
    ("squat", [0.0, 0.0, 0.0, 0.3, 0.3, 0.9, 1.0]),
];

fn weights_for(workout_name: &str) -> Option<[f64; 7]> {
    let name = workout_name.trim().to_lowercase();
    let name = name.trim_end_matches('s');
    MUSCLE_TABLE
        .iter()
        .find(|(exercise, _)| *exercise == name)
        .map(|(_, weights)| *weights)
}

/// Development per muscle group, each in `0..=max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MuscleGroupScores {
    pub chest: f64,
    pub bicep: f64,
    pub tricep: f64,
    pub back: f64,
    pub abs: f64,
    pub glutes: f64,
    pub leg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

impl ScoreBand {
    pub fn for_score(score: u32) -> Self {
        match score {
            s if s >= 80 => ScoreBand::Excellent,
            s if s >= 60 => ScoreBand::Good,
            s if s >= 40 => ScoreBand::Fair,
            _ => ScoreBand::NeedsWork,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Fair => "Fair",
            ScoreBand::NeedsWork => "Needs work",
        }
    }
}

impl MuscleGroupScores {
    /// Scores from per-exercise rep totals. Unknown exercises are ignored.
    pub fn from_totals(totals: &BTreeMap<String, i64>, target_reps: i64, max: f64) -> Self {
        let mut raw = [0.0f64; 7];
        let target = target_reps.max(1) as f64;

        for (workout_name, reps) in totals {
            let Some(weights) = weights_for(workout_name) else {
                log::debug!("Unknown exercise '{}' ignored for muscle scores", workout_name);
                continue;
            };
            let progress = (*reps).max(0) as f64 / target;
            for (slot, weight) in raw.iter_mut().zip(weights) {
                *slot += progress * weight;
            }
        }

        let scale = |value: f64| value.min(1.0) * max;
        Self {
            chest: scale(raw[0]),
            bicep: scale(raw[1]),
            tricep: scale(raw[2]),
            back: scale(raw[3]),
            abs: scale(raw[4]),
            glutes: scale(raw[5]),
            leg: scale(raw[6]),
        }
    }

    pub fn as_array(&self) -> [(&'static str, f64); 7] {
        [
            ("Chest", self.chest),
            ("Bicep", self.bicep),
            ("Tricep", self.tricep),
            ("Back", self.back),
            ("Abs", self.abs),
            ("Glutes", self.glutes),
            ("Legs", self.leg),
        ]
    }

    /// Percentage of the full radar that is filled.
    pub fn overall_score(&self, max: f64) -> u32 {
        if max <= 0.0 {
            return 0;
        }
        let sum: f64 = self.as_array().iter().map(|(_, v)| v.clamp(0.0, max)).sum();
        (sum / (7.0 * max) * 100.0).round() as u32
    }
}
