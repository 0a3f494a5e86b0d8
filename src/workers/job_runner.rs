use crate::modules::jobs::context::JobContext;
use crate::modules::jobs::dispatcher::QueuedJob;
use crate::modules::jobs::dto::{JobDescriptor, JobOutcome, JobOutput, JobResult};
use crate::modules::jobs::error::{JobError, Step};
use crate::modules::jobs::events::JobEvent;
use crate::modules::jobs::executors;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs queued jobs strictly one after another until the queue is closed
/// and drained.
pub(crate) async fn start_job_worker(
    ctx: JobContext,
    rx: async_channel::Receiver<QueuedJob>,
    events: broadcast::Sender<JobEvent>,
) {
    info!(
        "🎥 Starting job worker (scratch dir {})",
        ctx.scratch.dir().display()
    );

    while let Ok(job) = rx.recv().await {
        let id = job.id;
        let operation = job.descriptor.operation.kind();

        let outcome = if job.cancel.is_cancelled() {
            Err(JobError::Cancelled { step: Step::Queued })
        } else {
            info!("📦 Starting {} job {}", operation, id);
            let _ = events.send(JobEvent::Started {
                job_id: id,
                operation,
            });
            run_isolated(&ctx, id, job.descriptor, job.cancel).await
        };

        match &outcome {
            Ok(_) => info!("✅ Job {} completed", id),
            Err(e) => error!("❌ Job {} failed: {}", id, e),
        }

        let _ = events.send(JobEvent::Finished {
            job_id: id,
            success: outcome.is_ok(),
        });

        // Nobody is waiting; a file handed to the caller would leak.
        if let Err(Ok(unclaimed)) = job.reply.send(outcome) {
            debug!("Result of job {} was not collected", id);
            if let JobOutput::Local(artifact) = unclaimed.output {
                let path = artifact.path.clone();
                if let Err(e) = artifact.release().await {
                    warn!("Failed to remove unclaimed output {}: {}", path.display(), e);
                }
            }
        }
    }

    info!("🎥 Job worker stopped");
}

/// Executes one job on its own task so that a panic inside a collaborator
/// fails only this job. The scratch file is allocated here, so it can still
/// be removed when the task dies.
async fn run_isolated(
    ctx: &JobContext,
    id: Uuid,
    descriptor: JobDescriptor,
    cancel: CancellationToken,
) -> JobOutcome {
    let operation = descriptor.operation.kind();
    let scratch = ctx
        .scratch
        .allocate(descriptor.operation.output_extension());

    let task = tokio::spawn({
        let ctx = ctx.clone();
        let scratch = scratch.clone();
        async move { executors::execute(&ctx, &descriptor, scratch, &cancel).await }
    });

    match task.await {
        Ok(done) => done.map(|done| JobResult {
            job_id: id,
            operation,
            file_name: done.file_name,
            output: done.output,
        }),
        Err(e) => {
            let reason = crash_reason(e);
            error!("💥 Job {} crashed: {}", id, reason);
            ctx.scratch.release(&scratch).await;
            Err(JobError::Crashed(reason))
        }
    }
}

fn crash_reason(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}
