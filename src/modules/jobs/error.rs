use crate::infrastructure::encoder::EncoderError;
use crate::infrastructure::storage::StoreError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Validate,
    Queued,
    Encode,
    Capture,
    Read,
    Upload,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Queued => "queued",
            Self::Encode => "encode",
            Self::Capture => "capture",
            Self::Read => "read",
            Self::Upload => "upload",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("operation type must be set on the job")]
    MissingOperation,

    #[error("{0} operation type not supported")]
    UnsupportedOperation(String),

    #[error("invalid job parameters: {0}")]
    InvalidParameters(String),

    #[error("object store is not configured; uploads are unavailable")]
    StoreNotConfigured,

    #[error("encode failed: {}", .0.diagnostics())]
    EncodeFailure(#[source] EncoderError),

    #[error("frame capture failed: {}", .0.diagnostics())]
    CaptureFailure(#[source] EncoderError),

    #[error("failed to read {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("upload failed: {0}")]
    UploadFailure(#[source] StoreError),

    #[error("{step} step timed out after {}s", .limit.as_secs())]
    Timeout { step: Step, limit: Duration },

    #[error("job cancelled during {step} step")]
    Cancelled { step: Step },

    #[error("dispatcher is not accepting jobs")]
    DispatcherClosed,

    #[error("job aborted unexpectedly: {0}")]
    Crashed(String),
}

impl JobError {
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::MissingOperation
            | Self::UnsupportedOperation(_)
            | Self::InvalidParameters(_)
            | Self::StoreNotConfigured => Some(Step::Validate),
            Self::EncodeFailure(_) => Some(Step::Encode),
            Self::CaptureFailure(_) => Some(Step::Capture),
            Self::Filesystem { .. } => Some(Step::Read),
            Self::UploadFailure(_) => Some(Step::Upload),
            Self::Timeout { step, .. } | Self::Cancelled { step } => Some(*step),
            Self::DispatcherClosed | Self::Crashed(_) => None,
        }
    }

    /// True for errors raised before the job touched anything.
    pub fn is_validation(&self) -> bool {
        self.step() == Some(Step::Validate)
    }
}
