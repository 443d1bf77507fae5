use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::ClientError;

/// Something that can hand over the current camera frame as JPEG bytes.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<Vec<u8>, ClientError>;
}

/// Replays the JPEG files of a directory in name order, wrapping around.
///
/// Stands in for the device camera when running sessions from recorded
/// footage.
#[derive(Debug)]
pub struct DirectoryFrameSource {
    frames: Vec<PathBuf>,
    cursor: AtomicUsize,
}

impl DirectoryFrameSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ClientError> {
        let dir = dir.as_ref();
        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| ClientError::Capture(format!("Cannot read {}: {}", dir.display(), e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_jpeg(path))
            .collect();

        if frames.is_empty() {
            return Err(ClientError::Capture(format!("No JPEG frames in {}", dir.display())));
        }

        frames.sort();
        log::info!("🎞️  Loaded {} frames from {}", frames.len(), dir.display());

        Ok(Self {
            frames,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn capture(&self) -> Result<Vec<u8>, ClientError> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        let path = &self.frames[index];

        tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Capture(format!("{}: {}", path.display(), e)))
    }
}
