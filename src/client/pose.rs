use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{
    models::Exercise,
    utils::{build_client, join_url, ClientError},
};

/// What the pose service says about a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseAnalysis {
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default, alias = "reps", alias = "count")]
    pub rep_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishRequest {
    pub session_id: String,
    /// Seconds of correct hold (timed exercises) or active session time.
    pub final_time: f64,
    pub reps: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FinishResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
struct FramePayload<'a> {
    image: String,
    session_id: &'a str,
}

/// The external pose-estimation service.
#[async_trait]
pub trait PoseAnalyzer: Send + Sync {
    async fn analyze(&self, exercise: Exercise, session_id: &str, frame: &[u8]) -> Result<PoseAnalysis, ClientError>;

    async fn finish(&self, exercise: Exercise, request: &FinishRequest) -> Result<FinishResponse, ClientError>;
}

/// Pose service reached over plain HTTP with base64-encoded JPEG frames.
pub struct HttpPoseAnalyzer {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPoseAnalyzer {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: build_client(timeout),
        }
    }

    pub fn frame_url(&self, exercise: Exercise) -> String {
        join_url(&self.base_url, exercise.as_str())
    }

    pub fn finish_url(&self, exercise: Exercise) -> String {
        join_url(&self.base_url, &format!("{}/end", exercise.as_str()))
    }

    async fn post_json<T, R>(&self, url: &str, body: &T) -> Result<R, ClientError>
    where
        T: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: String::new(),
            });
        }

        response.json::<R>().await.map_err(ClientError::from)
    }
}

pub fn encode_frame(frame: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(frame)
}

#[async_trait]
impl PoseAnalyzer for HttpPoseAnalyzer {
    async fn analyze(&self, exercise: Exercise, session_id: &str, frame: &[u8]) -> Result<PoseAnalysis, ClientError> {
        let payload = FramePayload {
            image: encode_frame(frame),
            session_id,
        };

        let url = self.frame_url(exercise);
        log::debug!("📸 Sending {} byte frame to {}", frame.len(), url);

        self.post_json(&url, &payload).await
    }

    async fn finish(&self, exercise: Exercise, request: &FinishRequest) -> Result<FinishResponse, ClientError> {
        let url = self.finish_url(exercise);
        log::info!("🏁 Ending {} session {} ({:.1}s, {} reps)", exercise, request.session_id, request.final_time, request.reps);

        self.post_json(&url, request).await
    }
}
