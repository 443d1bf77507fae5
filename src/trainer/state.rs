use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::{
    client::{FinishRequest, FinishResponse, PoseAnalysis},
    models::Exercise,
    services::workout_service::LogWorkoutRequest,
    utils::ClientError,
};

pub const INITIAL_FEEDBACK: &str = "Initializing...";
pub const NO_FEEDBACK: &str = "No feedback";
pub const PAUSED_FEEDBACK: &str = "Analysis paused.";
pub const RESUMED_FEEDBACK: &str = "Resumed analysis.";
pub const ENDING_FEEDBACK: &str = "Sending final time...";
pub const FINISHED_FEEDBACK: &str = "Final time sent successfully!";
const FRAME_ERROR_PREFIX: &str = "Error sending frame: ";

/// What a session looks like right now, as a screen would render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub exercise: Exercise,
    pub rep_count: u32,
    pub feedback: String,
    pub hold_seconds: f64,
    pub running: bool,
    pub ended: bool,
    pub in_flight: bool,
}

/// Outcome of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub exercise: Exercise,
    pub reps: u32,
    /// Hold time for timed exercises, active (unpaused) time otherwise.
    pub time_taken: f64,
    pub frames_sent: u32,
    pub frames_failed: u32,
    pub skipped_ticks: u32,
    pub final_feedback: String,
}

impl SessionReport {
    /// End-of-session summary in the shape the workout API appends.
    pub fn to_workout(&self, email: &str, date: DateTime<Utc>) -> LogWorkoutRequest {
        LogWorkoutRequest {
            email: Some(email.to_string()),
            workout_name: Some(self.exercise.as_str().to_string()),
            reps: Some(i64::from(self.reps)),
            time_taken: Some((self.time_taken * 10.0).round() / 10.0),
            date: Some(date.to_rfc3339()),
        }
    }
}

/// Things worth saying out loud after a state change.
#[derive(Debug, Default, PartialEq)]
pub struct Narration {
    pub rep_count: Option<u32>,
    pub feedback: Option<String>,
}

/// Mutable state of one training session. Pure bookkeeping: the polling
/// loop decides when things happen, this decides what they mean.
#[derive(Debug)]
pub struct SessionState {
    session_id: String,
    exercise: Exercise,
    rep_count: u32,
    feedback: String,
    hold: Duration,
    running: bool,
    ended: bool,
    in_flight: bool,
    frames_sent: u32,
    frames_failed: u32,
    skipped_ticks: u32,
    active: Duration,
    active_since: Option<Instant>,
}

impl SessionState {
    pub fn new(exercise: Exercise, session_id: String, now: Instant) -> Self {
        Self {
            session_id,
            exercise,
            rep_count: 0,
            feedback: INITIAL_FEEDBACK.to_string(),
            hold: Duration::ZERO,
            running: true,
            ended: false,
            in_flight: false,
            frames_sent: 0,
            frames_failed: 0,
            skipped_ticks: 0,
            active: Duration::ZERO,
            active_since: Some(now),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Frames may be captured only while running and not ended.
    pub fn accepts_frames(&self) -> bool {
        self.running && !self.ended
    }

    pub fn begin_request(&mut self) {
        self.in_flight = true;
    }

    /// A capture tick arrived while a request was still outstanding.
    pub fn skip_tick(&mut self) {
        self.skipped_ticks += 1;
    }

    pub fn apply_analysis(&mut self, result: Result<PoseAnalysis, ClientError>) -> Narration {
        self.in_flight = false;
        let mut narration = Narration::default();

        match result {
            Ok(analysis) => {
                self.frames_sent += 1;

                if let Some(count) = analysis.rep_count {
                    if count != self.rep_count {
                        self.rep_count = count;
                        narration.rep_count = Some(count);
                    }
                }

                let feedback = analysis
                    .feedback
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| NO_FEEDBACK.to_string());

                if feedback != self.feedback && feedback != NO_FEEDBACK {
                    narration.feedback = Some(feedback.clone());
                }
                self.feedback = feedback;
            }
            Err(e) => {
                self.frames_failed += 1;
                log::warn!("⚠️  Frame analysis failed: {}", e);
                self.feedback = format!("{}{}", FRAME_ERROR_PREFIX, e);
            }
        }

        narration
    }

    /// Grows the hold timer when the current feedback says the hold is good.
    /// Returns whether the timer moved.
    pub fn tick_hold(&mut self, step: Duration) -> bool {
        let holding = match self.exercise.hold_marker() {
            Some(marker) => self.accepts_frames() && self.feedback.to_lowercase().contains(marker),
            None => false,
        };

        if holding {
            self.hold += step;
        }
        holding
    }

    pub fn pause(&mut self, now: Instant) -> bool {
        if self.ended || !self.running {
            return false;
        }
        self.running = false;
        self.stop_clock(now);
        self.feedback = PAUSED_FEEDBACK.to_string();
        true
    }

    pub fn resume(&mut self, now: Instant) -> bool {
        if self.ended || self.running {
            return false;
        }
        self.running = true;
        self.active_since = Some(now);
        self.feedback = RESUMED_FEEDBACK.to_string();
        true
    }

    pub fn toggle(&mut self, now: Instant) -> bool {
        if self.running {
            self.pause(now)
        } else {
            self.resume(now)
        }
    }

    pub fn end(&mut self, now: Instant) {
        self.running = false;
        self.ended = true;
        self.in_flight = false;
        self.stop_clock(now);
        self.feedback = ENDING_FEEDBACK.to_string();
    }

    fn stop_clock(&mut self, now: Instant) {
        if let Some(since) = self.active_since.take() {
            self.active += now.saturating_duration_since(since);
        }
    }

    pub fn time_taken(&self) -> f64 {
        if self.exercise.is_timed() {
            self.hold.as_secs_f64()
        } else {
            self.active.as_secs_f64()
        }
    }

    pub fn finish_request(&self) -> FinishRequest {
        FinishRequest {
            session_id: self.session_id.clone(),
            final_time: self.time_taken(),
            reps: self.rep_count,
        }
    }

    pub fn apply_finish(&mut self, result: Result<FinishResponse, ClientError>) {
        self.feedback = match result {
            Ok(response) => response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| FINISHED_FEEDBACK.to_string()),
            Err(e) => format!("Error sending final time: {}", e),
        };
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            exercise: self.exercise,
            rep_count: self.rep_count,
            feedback: self.feedback.clone(),
            hold_seconds: self.hold.as_secs_f64(),
            running: self.running,
            ended: self.ended,
            in_flight: self.in_flight,
        }
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.session_id.clone(),
            exercise: self.exercise,
            reps: self.rep_count,
            time_taken: self.time_taken(),
            frames_sent: self.frames_sent,
            frames_failed: self.frames_failed,
            skipped_ticks: self.skipped_ticks,
            final_feedback: self.feedback.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn analysis(feedback: &str, reps: Option<u32>) -> Result<PoseAnalysis, ClientError> {
        Ok(PoseAnalysis {
            feedback: Some(feedback.to_string()),
            rep_count: reps,
        })
    }

    #[test]
    fn test_rep_and_feedback_changes_are_narrated_once() {
        let mut state = SessionState::new(Exercise::Pushup, "s1".into(), Instant::now());

        let first = state.apply_analysis(analysis("Go lower", Some(0)));
        assert_eq!(first, Narration { rep_count: None, feedback: Some("Go lower".into()) });

        let second = state.apply_analysis(analysis("Go lower", Some(1)));
        assert_eq!(second, Narration { rep_count: Some(1), feedback: None });
        assert_eq!(state.rep_count(), 1);
    }

    #[test]
    fn test_missing_feedback_and_errors() {
        let mut state = SessionState::new(Exercise::Twist, "s1".into(), Instant::now());

        let narration = state.apply_analysis(Ok(PoseAnalysis::default()));
        assert_eq!(state.feedback(), NO_FEEDBACK);
        assert_eq!(narration, Narration::default());

        let narration = state.apply_analysis(Err(ClientError::Api { status: 500, message: String::new() }));
        assert_eq!(state.feedback(), "Error sending frame: Server error: 500");
        assert_eq!(narration, Narration::default());

        let report = state.report();
        assert_eq!((report.frames_sent, report.frames_failed), (1, 1));
    }

    #[test]
    fn test_hold_only_grows_on_good_plank_while_running() {
        let now = Instant::now();
        let step = Duration::from_millis(100);
        let mut state = SessionState::new(Exercise::Plank, "s1".into(), now);

        assert!(!state.tick_hold(step));

        state.apply_analysis(analysis("GOOD PLANK, keep going", None));
        assert!(state.tick_hold(step));
        assert!(state.tick_hold(step));

        state.pause(now);
        assert!(!state.tick_hold(step));
        assert_eq!(state.hold(), Duration::from_millis(200));
        assert!((state.time_taken() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_pushups_never_accumulate_hold() {
        let mut state = SessionState::new(Exercise::Pushup, "s1".into(), Instant::now());
        state.apply_analysis(analysis("good plank", None));
        assert!(!state.tick_hold(Duration::from_millis(100)));
    }

    #[test]
    fn test_pause_resume_and_end() {
        let start = Instant::now();
        let mut state = SessionState::new(Exercise::Pushup, "s1".into(), start);

        assert!(state.toggle(start + Duration::from_secs(10)));
        assert_eq!(state.feedback(), PAUSED_FEEDBACK);
        assert!(!state.accepts_frames());
        assert!(!state.pause(start + Duration::from_secs(11)));

        assert!(state.toggle(start + Duration::from_secs(20)));
        assert_eq!(state.feedback(), RESUMED_FEEDBACK);

        state.end(start + Duration::from_secs(25));
        assert_eq!(state.feedback(), ENDING_FEEDBACK);
        assert!(!state.toggle(start + Duration::from_secs(26)));
        assert!(!state.resume(start + Duration::from_secs(27)));

        // 10s before the pause plus 5s after resuming
        assert!((state.time_taken() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_finish_feedback() {
        let mut state = SessionState::new(Exercise::Plank, "s1".into(), Instant::now());

        state.apply_finish(Ok(FinishResponse { message: None }));
        assert_eq!(state.feedback(), FINISHED_FEEDBACK);

        state.apply_finish(Ok(FinishResponse { message: Some("Saved 42.0s".into()) }));
        assert_eq!(state.feedback(), "Saved 42.0s");

        state.apply_finish(Err(ClientError::Http("connection refused".into())));
        assert_eq!(state.feedback(), "Error sending final time: connection refused");
    }

    #[test]
    fn test_report_to_workout() {
        let report = SessionReport {
            session_id: "s1".into(),
            exercise: Exercise::Plank,
            reps: 0,
            time_taken: 61.2999999,
            frames_sent: 60,
            frames_failed: 1,
            skipped_ticks: 0,
            final_feedback: FINISHED_FEEDBACK.into(),
        };
        let date = Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();

        let request = report.to_workout("ana@example.com", date);
        assert_eq!(request.workout_name.as_deref(), Some("plank"));
        assert_eq!(request.time_taken, Some(61.3));
        assert_eq!(request.date.as_deref(), Some("2025-05-01T08:00:00+00:00"));
    }
}
