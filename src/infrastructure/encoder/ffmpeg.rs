use super::{Encoder, EncoderError, TranscodeSpec};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs the ffmpeg CLI as a child process.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn transcode_args(source: &Path, spec: &TranscodeSpec, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-c:v".to_string(),
            spec.video_codec.clone(),
            "-c:a".to_string(),
            spec.audio_codec.clone(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn capture_args(source: &Path, offset: Duration, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            // Input-side seek
            "-ss".to_string(),
            format!("{:.3}", offset.as_secs_f64()),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    async fn run(&self, args: Vec<String>, stop: &CancellationToken) -> Result<(), EncoderError> {
        let binary = self.binary.to_string_lossy().to_string();
        debug!("Running encoder: {} {}", binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EncoderError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));

        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = stop.cancelled() => None,
        };

        let Some(status) = status else {
            // Reap the process so it cannot write to the output afterwards
            if let Err(e) = child.kill().await {
                warn!("Failed to stop encoder process: {}", e);
            }
            debug!("Encoder process stopped");
            return Err(EncoderError::Stopped);
        };

        let status = status.map_err(|source| EncoderError::Spawn { binary, source })?;
        if status.success() {
            return Ok(());
        }

        let exit_code = status.code();
        Err(EncoderError::Failed {
            message: match exit_code {
                Some(code) => format!("ffmpeg exited with status {}", code),
                None => "ffmpeg terminated by signal".to_string(),
            },
            exit_code,
            stdout: stdout.await.unwrap_or_default(),
            stderr: stderr.await.unwrap_or_default(),
        })
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn transcode(
        &self,
        source: &Path,
        spec: &TranscodeSpec,
        output: &Path,
        stop: &CancellationToken,
    ) -> Result<(), EncoderError> {
        self.run(Self::transcode_args(source, spec, output), stop).await
    }

    async fn capture_frame(
        &self,
        source: &Path,
        offset: Duration,
        output: &Path,
        stop: &CancellationToken,
    ) -> Result<(), EncoderError> {
        self.run(Self::capture_args(source, offset, output), stop).await
    }
}
