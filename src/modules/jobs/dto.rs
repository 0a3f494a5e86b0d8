use super::error::JobError;
use crate::infrastructure::encoder::TranscodeSpec;
use crate::infrastructure::scratch::{ScratchFile, remove_if_exists};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_VIDEO_CODEC: &str = "libx264";
const DEFAULT_AUDIO_CODEC: &str = "aac";
const DEFAULT_CONTAINER: &str = "mp4";
const DEFAULT_IMAGE_FORMAT: &str = "png";

// --- REQUEST ---

/// A job as submitted by a caller, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct JobRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "source_path is required"))]
    pub source_path: String,
    #[serde(default)]
    pub operation: Option<OperationRequest>,
    #[serde(default)]
    #[validate(nested)]
    pub destination: Option<Destination>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub container: Option<String>,
    /// Seconds from the start of the source.
    pub capture_time_offset: Option<f64>,
    pub image_format: Option<String>,
}

/// Where to put the job's output in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Destination {
    #[validate(length(min = 1, message = "bucket is required"))]
    pub bucket: String,
    #[validate(length(min = 1, message = "key is required"))]
    pub key: String,
    pub acl: Option<String>,
    pub content_type: Option<String>,
}

impl JobRequest {
    pub fn transcode(source_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            operation: Some(OperationRequest {
                kind: Some(OperationKind::Transcode.to_string()),
                ..Default::default()
            }),
            destination: None,
        }
    }

    pub fn still_frame(source_path: impl Into<String>, capture_time_offset: f64) -> Self {
        Self {
            source_path: source_path.into(),
            operation: Some(OperationRequest {
                kind: Some(OperationKind::StillFrame.to_string()),
                capture_time_offset: Some(capture_time_offset),
                ..Default::default()
            }),
            destination: None,
        }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }
}

// --- VALIDATED JOB ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Transcode,
    StillFrame,
}

impl OperationKind {
    /// Accepts the canonical names and the older `transcodeMP4`/`stillShot`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "transcode" | "transcodemp4" | "transcode_mp4" => Some(Self::Transcode),
            "still_frame" | "stillframe" | "still-frame" | "stillshot" => Some(Self::StillFrame),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transcode => f.write_str("transcode"),
            Self::StillFrame => f.write_str("still_frame"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeParams {
    pub spec: TranscodeSpec,
    pub container: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillFrameParams {
    pub offset: Duration,
    pub image_format: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Transcode(TranscodeParams),
    StillFrame(StillFrameParams),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Transcode(_) => OperationKind::Transcode,
            Self::StillFrame(_) => OperationKind::StillFrame,
        }
    }

    /// Extension of the file this operation produces.
    pub fn output_extension(&self) -> &str {
        match self {
            Self::Transcode(params) => &params.container,
            Self::StillFrame(params) => &params.image_format,
        }
    }
}

/// A validated, immutable unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub source_path: PathBuf,
    pub operation: Operation,
    pub destination: Option<Destination>,
}

impl TryFrom<JobRequest> for JobDescriptor {
    type Error = JobError;

    fn try_from(request: JobRequest) -> Result<Self, Self::Error> {
        let op = request.operation.as_ref().ok_or(JobError::MissingOperation)?;
        let name = op
            .kind
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(JobError::MissingOperation)?;
        let kind = OperationKind::parse(name)
            .ok_or_else(|| JobError::UnsupportedOperation(name.to_string()))?;

        request
            .validate()
            .map_err(|e| JobError::InvalidParameters(e.to_string()))?;

        let operation = match kind {
            OperationKind::Transcode => Operation::Transcode(TranscodeParams {
                spec: TranscodeSpec {
                    video_codec: token(
                        op.video_codec.as_deref(),
                        DEFAULT_VIDEO_CODEC,
                        "video_codec",
                    )?,
                    audio_codec: token(
                        op.audio_codec.as_deref(),
                        DEFAULT_AUDIO_CODEC,
                        "audio_codec",
                    )?,
                },
                container: extension(op.container.as_deref(), DEFAULT_CONTAINER, "container")?,
            }),
            OperationKind::StillFrame => Operation::StillFrame(StillFrameParams {
                offset: capture_offset(op.capture_time_offset)?,
                image_format: extension(
                    op.image_format.as_deref(),
                    DEFAULT_IMAGE_FORMAT,
                    "image_format",
                )?,
            }),
        };

        Ok(Self {
            source_path: PathBuf::from(request.source_path),
            operation,
            destination: request.destination,
        })
    }
}

fn token(value: Option<&str>, default: &str, field: &str) -> Result<String, JobError> {
    match value.map(str::trim) {
        None => Ok(default.to_string()),
        Some("") => Err(JobError::InvalidParameters(format!("{} must not be empty", field))),
        Some(v) => Ok(v.to_string()),
    }
}

fn extension(value: Option<&str>, default: &str, field: &str) -> Result<String, JobError> {
    let value = token(value, default, field)?;
    if value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(JobError::InvalidParameters(format!(
            "{} '{}' is not a file extension",
            field, value
        )))
    }
}

fn capture_offset(seconds: Option<f64>) -> Result<Duration, JobError> {
    let seconds = seconds.ok_or_else(|| {
        JobError::InvalidParameters("capture_time_offset is required for still_frame".to_string())
    })?;
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        JobError::InvalidParameters(format!(
            "capture_time_offset must be a non-negative number of seconds, got {}",
            seconds
        ))
    })
}

// --- RESULT ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadConfirmation {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub e_tag: Option<String>,
    pub version_id: Option<String>,
}

/// An output file the caller now owns. Nothing deletes it until
/// [`LocalArtifact::release`] is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalArtifact {
    pub file_name: String,
    pub path: PathBuf,
}

impl LocalArtifact {
    pub async fn release(self) -> std::io::Result<()> {
        remove_if_exists(&self.path).await
    }
}

impl From<ScratchFile> for LocalArtifact {
    fn from(file: ScratchFile) -> Self {
        Self {
            file_name: file.file_name,
            path: file.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOutput {
    Uploaded(UploadConfirmation),
    Local(LocalArtifact),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub operation: OperationKind,
    pub file_name: String,
    pub output: JobOutput,
}

pub type JobOutcome = Result<JobResult, JobError>;
