use async_trait::async_trait;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::utils::ClientError;

/// Text-to-speech output.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), ClientError>;
}

/// Writes narration to the log. Used when no TTS program is configured.
pub struct LogNarrator;

#[async_trait]
impl Narrator for LogNarrator {
    async fn speak(&self, text: &str) -> Result<(), ClientError> {
        log::info!("🔊 {}", text);
        Ok(())
    }
}

/// Runs an external TTS program (e.g. `espeak` or `say`) with the text as
/// its last argument.
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
}

impl CommandNarrator {
    /// Splits a command line such as `espeak -v "en us" -s 160` into
    /// program and args, with shell quoting rules.
    pub fn from_command_line(command_line: &str) -> Result<Self, ClientError> {
        let words = shell_words::split(command_line)
            .map_err(|e| ClientError::InvalidInput(format!("Invalid TTS command: {}", e)))?;

        let mut parts = words.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| ClientError::InvalidInput("TTS command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl Narrator for CommandNarrator {
    async fn speak(&self, text: &str) -> Result<(), ClientError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .await
            .map_err(|e| ClientError::Speech(format!("{}: {}", self.program, e)))?;

        if !status.success() {
            return Err(ClientError::Speech(format!("{} exited with {}", self.program, status)));
        }
        Ok(())
    }
}

/// Only speaks when the text differs from what was spoken last.
pub struct ChangeNarrator<N> {
    inner: N,
    last: Mutex<Option<String>>,
}

impl<N: Narrator> ChangeNarrator<N> {
    pub fn new(inner: N) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }

    /// Returns whether anything was spoken. Speech failures are logged and
    /// swallowed: narration never interrupts a session.
    pub async fn announce(&self, text: &str) -> bool {
        {
            let mut last = self.last.lock().await;
            if last.as_deref() == Some(text) {
                return false;
            }
            *last = Some(text.to_string());
        }

        if let Err(e) = self.inner.speak(text).await {
            log::warn!("⚠️  {}", e);
        }
        true
    }
}

#[async_trait]
impl<N: Narrator> Narrator for ChangeNarrator<N> {
    async fn speak(&self, text: &str) -> Result<(), ClientError> {
        self.announce(text).await;
        Ok(())
    }
}

#[async_trait]
impl Narrator for Arc<dyn Narrator> {
    async fn speak(&self, text: &str) -> Result<(), ClientError> {
        self.as_ref().speak(text).await
    }
}
