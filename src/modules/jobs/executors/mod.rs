//! Step pipelines, one per operation type.
//!
//! Each executor is given one scratch file, runs its encoder step into it,
//! then either uploads and deletes the file or hands it to the caller.
//! Whatever fails, the scratch file is removed before the error is returned.

use super::context::JobContext;
use super::dto::{Destination, JobDescriptor, JobOutput, LocalArtifact, Operation};
use super::error::{JobError, Step};
use crate::infrastructure::scratch::ScratchFile;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub mod still_frame;
pub mod transcode;

pub use still_frame::StillFrameExecutor;
pub use transcode::TranscodeExecutor;

#[derive(Debug)]
pub struct ExecutorOutput {
    pub file_name: String,
    pub output: JobOutput,
}

/// Routes a job to the executor for its operation type. `scratch` should
/// come from [`Operation::output_extension`].
pub async fn execute(
    ctx: &JobContext,
    job: &JobDescriptor,
    scratch: ScratchFile,
    cancel: &CancellationToken,
) -> Result<ExecutorOutput, JobError> {
    match &job.operation {
        Operation::Transcode(params) => {
            TranscodeExecutor::execute(ctx, job, params, scratch, cancel).await
        }
        Operation::StillFrame(params) => {
            StillFrameExecutor::execute(ctx, job, params, scratch, cancel).await
        }
    }
}

/// Runs an encoder step under an optional time limit and the job's
/// cancellation. On either, the step's `stop` token fires and the step is
/// still awaited, so it is done with its output before anyone cleans up.
pub(crate) async fn supervised<T, F, Fut>(
    step: Step,
    limit: Option<Duration>,
    cancel: &CancellationToken,
    run: F,
) -> Result<T, JobError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, JobError>>,
{
    let stop = cancel.child_token();
    let fut = run(stop.clone());
    tokio::pin!(fut);

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    let reason = tokio::select! {
        biased;
        _ = cancel.cancelled() => JobError::Cancelled { step },
        result = &mut fut => return result,
        _ = deadline => JobError::Timeout {
            step,
            limit: limit.unwrap_or_default(),
        },
    };

    stop.cancel();
    if let Err(e) = fut.await {
        debug!("{} step wound down: {}", step, e);
    }
    Err(reason)
}

/// Runs one step under an optional time limit, giving up early if the job
/// is cancelled. The step future is dropped on either.
pub(crate) async fn guarded<T, F>(
    step: Step,
    limit: Option<Duration>,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, JobError>
where
    F: Future<Output = Result<T, JobError>>,
{
    let bounded = async {
        match limit {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(JobError::Timeout { step, limit }),
            },
            None => fut.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(JobError::Cancelled { step }),
        result = bounded => result,
    }
}

/// Uploads and deletes the scratch file when a destination is given,
/// otherwise transfers it to the caller.
async fn deliver(
    ctx: &JobContext,
    scratch: ScratchFile,
    destination: Option<&Destination>,
    cancel: &CancellationToken,
) -> Result<ExecutorOutput, JobError> {
    let Some(destination) = destination else {
        info!("📁 Output kept at {}", scratch.path.display());
        return Ok(ExecutorOutput {
            file_name: scratch.file_name.clone(),
            output: JobOutput::Local(LocalArtifact::from(scratch)),
        });
    };

    let uploaded = ctx
        .sink
        .upload(&scratch, destination, ctx.timeouts.upload, cancel)
        .await;
    ctx.scratch.release(&scratch).await;

    Ok(ExecutorOutput {
        file_name: scratch.file_name,
        output: JobOutput::Uploaded(uploaded?),
    })
}
