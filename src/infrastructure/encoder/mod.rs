use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod ffmpeg;

/// Codec selection for a transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSpec {
    pub video_codec: String,
    pub audio_codec: String,
}

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("failed to launch encoder '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Failed {
        message: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("encoder stopped before finishing")]
    Stopped,
}

impl EncoderError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Message plus whatever the process printed.
    pub fn diagnostics(&self) -> String {
        match self {
            Self::Spawn { .. } | Self::Stopped => self.to_string(),
            Self::Failed {
                message,
                stdout,
                stderr,
                ..
            } => {
                let mut text = message.clone();
                for (label, output) in [("stdout", stdout), ("stderr", stderr)] {
                    let output = output.trim();
                    if !output.is_empty() {
                        text.push_str(&format!("\n{}: {}", label, output));
                    }
                }
                text
            }
        }
    }
}

/// External media encoder. Every call resolves exactly once.
///
/// Once `stop` is cancelled, a call must halt its work and return
/// [`EncoderError::Stopped`] only after nothing can touch `output` any more.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn transcode(
        &self,
        source: &Path,
        spec: &TranscodeSpec,
        output: &Path,
        stop: &CancellationToken,
    ) -> Result<(), EncoderError>;

    async fn capture_frame(
        &self,
        source: &Path,
        offset: Duration,
        output: &Path,
        stop: &CancellationToken,
    ) -> Result<(), EncoderError>;
}
