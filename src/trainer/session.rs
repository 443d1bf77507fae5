use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use super::state::{Narration, SessionReport, SessionSnapshot, SessionState};
use crate::{
    client::{ChangeNarrator, FrameSource, Narrator, PoseAnalysis, PoseAnalyzer},
    config::TrainerConfig,
    models::Exercise,
    utils::ClientError,
};

/// Commands a screen can send to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    /// Pause when running, resume when paused.
    Toggle,
    End,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub capture_interval: Duration,
    pub hold_tick: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            capture_interval: Duration::from_millis(1000),
            hold_tick: Duration::from_millis(100),
        }
    }
}

impl From<&TrainerConfig> for SessionSettings {
    fn from(config: &TrainerConfig) -> Self {
        Self {
            capture_interval: config.capture_interval,
            hold_tick: config.hold_tick,
        }
    }
}

enum Speech {
    Reps(u32),
    Feedback(String),
}

/// One training session: captures a frame every `capture_interval`, sends it
/// to the pose service, and folds the answer into the session state.
///
/// At most one capture/analyze request is outstanding at any time; ticks
/// that arrive while one is pending are skipped, not queued.
pub struct TrainingSession<A, F> {
    exercise: Exercise,
    session_id: String,
    settings: SessionSettings,
    analyzer: A,
    frames: F,
    narrator: Arc<dyn Narrator>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<A: PoseAnalyzer, F: FrameSource> TrainingSession<A, F> {
    pub fn new(
        exercise: Exercise,
        analyzer: A,
        frames: F,
        narrator: Arc<dyn Narrator>,
        settings: SessionSettings,
    ) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let initial = SessionState::new(exercise, session_id.clone(), Instant::now()).snapshot();
        let (snapshots, _) = watch::channel(initial);

        Self {
            exercise,
            session_id,
            settings,
            analyzer,
            frames,
            narrator,
            snapshots,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Live view of the session state, updated on every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    fn publish(&self, state: &SessionState) {
        self.snapshots.send_replace(state.snapshot());
    }

    /// Runs until `Control::End` arrives or the control channel closes, then
    /// reports the session to the pose service and returns the summary.
    pub async fn run(self, mut controls: mpsc::Receiver<Control>) -> SessionReport {
        let exercise = self.exercise;
        let mut state = SessionState::new(exercise, self.session_id.clone(), Instant::now());
        self.publish(&state);

        log::info!(
            "🏋️ Starting {} session {} (capture every {}ms)",
            exercise,
            self.session_id,
            self.settings.capture_interval.as_millis()
        );

        let (speech_tx, speech_rx) = mpsc::unbounded_channel();
        let speaker = tokio::spawn(speak_changes(self.narrator.clone(), speech_rx));

        let mut capture = interval(self.settings.capture_interval);
        capture.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut hold = interval(self.settings.hold_tick);
        hold.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let analyzer = &self.analyzer;
        let frames = &self.frames;
        let mut in_flight: Option<BoxFuture<'_, Result<PoseAnalysis, ClientError>>> = None;

        loop {
            tokio::select! {
                _ = capture.tick() => {
                    if !state.accepts_frames() {
                        continue;
                    }
                    if in_flight.is_some() {
                        state.skip_tick();
                        log::debug!("⏭️  Capture tick skipped, previous frame still in flight");
                        continue;
                    }

                    let session_id = state.session_id().to_string();
                    in_flight = Some(Box::pin(async move {
                        let frame = frames.capture().await?;
                        analyzer.analyze(exercise, &session_id, &frame).await
                    }));
                    state.begin_request();
                    self.publish(&state);
                }
                result = poll_slot(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    let narration = state.apply_analysis(result);
                    self.publish(&state);
                    queue_speech(&speech_tx, narration);
                }
                _ = hold.tick(), if exercise.is_timed() => {
                    if state.tick_hold(self.settings.hold_tick) {
                        self.publish(&state);
                    }
                }
                control = controls.recv() => {
                    let now = Instant::now();
                    let changed = match control {
                        Some(Control::Pause) => state.pause(now),
                        Some(Control::Resume) => state.resume(now),
                        Some(Control::Toggle) => state.toggle(now),
                        Some(Control::End) | None => break,
                    };
                    if changed {
                        log::info!("⏯️  Session {}: {}", self.session_id, state.feedback());
                        self.publish(&state);
                    }
                }
            }
        }

        // A frame still in flight belongs to a session that no longer exists
        drop(in_flight);

        state.end(Instant::now());
        self.publish(&state);

        let finish = state.finish_request();
        let result = self.analyzer.finish(exercise, &finish).await;
        if let Err(e) = &result {
            log::error!("❌ Failed to end session {}: {}", self.session_id, e);
        }
        state.apply_finish(result);
        self.publish(&state);

        drop(speech_tx);
        if let Err(e) = speaker.await {
            log::warn!("⚠️  Narration task failed: {}", e);
        }

        let report = state.report();
        log::info!(
            "✅ Session {} ended: {} reps, {:.1}s, {} frames ({} failed, {} ticks skipped)",
            report.session_id,
            report.reps,
            report.time_taken,
            report.frames_sent,
            report.frames_failed,
            report.skipped_ticks
        );
        report
    }
}

async fn poll_slot<T>(slot: &mut Option<BoxFuture<'_, T>>) -> T {
    match slot.as_mut() {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

fn queue_speech(tx: &mpsc::UnboundedSender<Speech>, narration: Narration) {
    if let Some(count) = narration.rep_count {
        let _ = tx.send(Speech::Reps(count));
    }
    if let Some(feedback) = narration.feedback {
        let _ = tx.send(Speech::Feedback(feedback));
    }
}

/// Speaks queued changes in order, off the capture loop so a slow TTS
/// program never delays the next frame.
async fn speak_changes(narrator: Arc<dyn Narrator>, mut rx: mpsc::UnboundedReceiver<Speech>) {
    let reps = ChangeNarrator::new(narrator.clone());
    let feedback = ChangeNarrator::new(narrator);

    while let Some(speech) = rx.recv().await {
        match speech {
            Speech::Reps(count) => reps.announce(&count.to_string()).await,
            Speech::Feedback(text) => feedback.announce(&text).await,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::narrator::tests::RecordingNarrator;
    use crate::client::{FinishRequest, FinishResponse};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted answers; the last one repeats once the script runs out.
    struct ScriptedAnalyzer {
        script: Mutex<VecDeque<Result<PoseAnalysis, ClientError>>>,
        fallback: PoseAnalysis,
        delay: Duration,
        calls: AtomicU32,
        finished: Mutex<Option<FinishRequest>>,
        finish_message: Option<String>,
    }

    impl ScriptedAnalyzer {
        fn new(script: Vec<Result<PoseAnalysis, ClientError>>, fallback: PoseAnalysis) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
                finished: Mutex::new(None),
                finish_message: Some("Session saved".into()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl PoseAnalyzer for Arc<ScriptedAnalyzer> {
        async fn analyze(&self, _: Exercise, session_id: &str, frame: &[u8]) -> Result<PoseAnalysis, ClientError> {
            assert!(!session_id.is_empty());
            assert_eq!(frame, b"jpeg");
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.fallback.clone()))
        }

        async fn finish(&self, _: Exercise, request: &FinishRequest) -> Result<FinishResponse, ClientError> {
            *self.finished.lock().unwrap() = Some(request.clone());
            Ok(FinishResponse { message: self.finish_message.clone() })
        }
    }

    struct StaticFrames;

    #[async_trait]
    impl FrameSource for StaticFrames {
        async fn capture(&self) -> Result<Vec<u8>, ClientError> {
            Ok(b"jpeg".to_vec())
        }
    }

    fn reply(feedback: &str, reps: Option<u32>) -> PoseAnalysis {
        PoseAnalysis { feedback: Some(feedback.to_string()), rep_count: reps }
    }

    /// Sends each control after the given delay from the start.
    fn schedule(steps: Vec<(u64, Control)>) -> mpsc::Receiver<Control> {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            let start = Instant::now();
            for (at_ms, control) in steps {
                tokio::time::sleep_until(start + Duration::from_millis(at_ms)).await;
                if tx.send(control).await.is_err() {
                    break;
                }
            }
        });
        rx
    }

    fn session(
        exercise: Exercise,
        analyzer: Arc<ScriptedAnalyzer>,
        narrator: RecordingNarrator,
    ) -> TrainingSession<Arc<ScriptedAnalyzer>, StaticFrames> {
        TrainingSession::new(exercise, analyzer, StaticFrames, Arc::new(narrator), SessionSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_reps_and_narrates_changes() {
        let analyzer = Arc::new(ScriptedAnalyzer::new(
            vec![
                Ok(reply("Go lower", Some(0))),
                Ok(reply("Good rep", Some(1))),
                Ok(reply("Good rep", Some(1))),
            ],
            reply("Good rep", Some(2)),
        ));
        let narrator = RecordingNarrator::default();

        let report = session(Exercise::Pushup, analyzer.clone(), narrator.clone())
            .run(schedule(vec![(3500, Control::End)]))
            .await;

        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 4);
        assert_eq!(report.reps, 2);
        assert_eq!(report.frames_sent, 4);
        assert_eq!(report.final_feedback, "Session saved");
        assert_eq!(narrator.lines(), vec!["Go lower", "1", "Good rep", "2"]);

        let finished = analyzer.finished.lock().unwrap().clone().unwrap();
        assert_eq!(finished.session_id, report.session_id);
        assert_eq!(finished.reps, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_overlaps_requests() {
        let analyzer = Arc::new(
            ScriptedAnalyzer::new(vec![], reply("Keep going", Some(1))).with_delay(Duration::from_millis(2500)),
        );

        let report = session(Exercise::Twist, analyzer.clone(), RecordingNarrator::default())
            .run(schedule(vec![(5200, Control::End)]))
            .await;

        // Requests start at 0s and 3s; the one started at 3s is dropped at the end
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.frames_sent, 1);
        assert!(report.skipped_ticks >= 3, "skipped {}", report.skipped_ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plank_hold_time_accumulates() {
        let analyzer = Arc::new(ScriptedAnalyzer::new(vec![], reply("Good plank!", None)));

        let report = session(Exercise::Plank, analyzer.clone(), RecordingNarrator::default())
            .run(schedule(vec![(2050, Control::End)]))
            .await;

        assert!(report.time_taken >= 1.9 && report.time_taken <= 2.2, "hold {}", report.time_taken);
        let finished = analyzer.finished.lock().unwrap().clone().unwrap();
        assert_eq!(finished.final_time, report.time_taken);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_capturing() {
        let analyzer = Arc::new(ScriptedAnalyzer::new(vec![], reply("Nice", Some(0))));
        let narrator = RecordingNarrator::default();
        let session = session(Exercise::Pushup, analyzer.clone(), narrator);
        let mut updates = session.subscribe();

        let report = session
            .run(schedule(vec![
                (1500, Control::Pause),
                (1600, Control::Toggle),
                (1700, Control::Toggle),
                (4500, Control::Resume),
                (5500, Control::End),
            ]))
            .await;

        // Captures at 0s, 1s, then nothing until the resume; 5s is the last
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);
        // 1.5s + 0.1s between the toggles + 1s after resuming
        assert!((report.time_taken - 2.6).abs() < 0.01, "active {}", report.time_taken);

        let last = updates.borrow_and_update().clone();
        assert!(last.ended);
        assert!(!last.running);
        assert_eq!(last.feedback, "Session saved");
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_keep_the_loop_going() {
        let analyzer = Arc::new(ScriptedAnalyzer::new(
            vec![Err(ClientError::Api { status: 502, message: String::new() })],
            reply("Good rep", Some(1)),
        ));
        let narrator = RecordingNarrator::default();

        let report = session(Exercise::Pushup, analyzer.clone(), narrator.clone())
            .run(schedule(vec![(1500, Control::End)]))
            .await;

        assert_eq!(report.frames_failed, 1);
        assert_eq!(report.frames_sent, 1);
        assert_eq!(narrator.lines(), vec!["1", "Good rep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_control_channel_ends_session() {
        let analyzer = Arc::new(ScriptedAnalyzer::new(vec![], reply("Nice", None)));
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        let report = session(Exercise::Twist, analyzer.clone(), RecordingNarrator::default())
            .run(rx)
            .await;

        assert_eq!(report.final_feedback, "Session saved");
        assert!(analyzer.finished.lock().unwrap().is_some());
    }
}
