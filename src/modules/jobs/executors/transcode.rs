use super::{ExecutorOutput, deliver, supervised};
use crate::infrastructure::scratch::ScratchFile;
use crate::modules::jobs::context::JobContext;
use crate::modules::jobs::dto::{JobDescriptor, TranscodeParams};
use crate::modules::jobs::error::{JobError, Step};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Encode, then upload if a destination is set. The encoded file never
/// outlives a failed job.
pub struct TranscodeExecutor;

impl TranscodeExecutor {
    pub async fn execute(
        ctx: &JobContext,
        job: &JobDescriptor,
        params: &TranscodeParams,
        scratch: ScratchFile,
        cancel: &CancellationToken,
    ) -> Result<ExecutorOutput, JobError> {
        info!(
            "🎞️ Transcoding {} -> {} (video {}, audio {})",
            job.source_path.display(),
            scratch.file_name,
            params.spec.video_codec,
            params.spec.audio_codec
        );

        let output = scratch.path.as_path();
        let encoded = supervised(Step::Encode, ctx.timeouts.encode, cancel, |stop| async move {
            ctx.encoder
                .transcode(&job.source_path, &params.spec, output, &stop)
                .await
                .map_err(JobError::EncodeFailure)
        })
        .await;

        if let Err(e) = encoded {
            error!("Transcode of {} failed: {}", job.source_path.display(), e);
            ctx.scratch.release(&scratch).await;
            return Err(e);
        }

        info!("Encoded {}", scratch.file_name);
        deliver(ctx, scratch, job.destination.as_ref(), cancel).await
    }
}
