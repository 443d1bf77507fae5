// Collaborators of a training session: the pose service, the camera, speech
// output and the account/workout API.
pub mod api_client;
pub mod camera;
pub mod narrator;
pub mod pose;

pub use api_client::ApiClient;
pub use camera::{DirectoryFrameSource, FrameSource};
pub use narrator::{ChangeNarrator, CommandNarrator, LogNarrator, Narrator};
pub use pose::{FinishRequest, FinishResponse, HttpPoseAnalyzer, PoseAnalysis, PoseAnalyzer};
