use super::{ExecutorOutput, deliver, supervised};
use crate::infrastructure::scratch::ScratchFile;
use crate::modules::jobs::context::JobContext;
use crate::modules::jobs::dto::{JobDescriptor, StillFrameParams};
use crate::modules::jobs::error::{JobError, Step};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct StillFrameExecutor;

impl StillFrameExecutor {
    /// Grabs exactly one frame at the requested offset.
    pub async fn execute(
        ctx: &JobContext,
        job: &JobDescriptor,
        params: &StillFrameParams,
        scratch: ScratchFile,
        cancel: &CancellationToken,
    ) -> Result<ExecutorOutput, JobError> {
        info!(
            "📸 Capturing frame at {:.3}s from {} -> {}",
            params.offset.as_secs_f64(),
            job.source_path.display(),
            scratch.file_name
        );

        let output = scratch.path.as_path();
        let captured = supervised(Step::Capture, ctx.timeouts.encode, cancel, |stop| async move {
            ctx.encoder
                .capture_frame(&job.source_path, params.offset, output, &stop)
                .await
                .map_err(JobError::CaptureFailure)
        })
        .await;

        if let Err(e) = captured {
            error!("Frame capture from {} failed: {}", job.source_path.display(), e);
            ctx.scratch.release(&scratch).await;
            return Err(e);
        }

        deliver(ctx, scratch, job.destination.as_ref(), cancel).await
    }
}
