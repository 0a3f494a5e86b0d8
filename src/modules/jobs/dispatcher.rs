use super::context::JobContext;
use super::dto::{JobDescriptor, JobOutcome, JobRequest};
use super::error::JobError;
use super::events::JobEvent;
use super::sink::UploadSink;
use crate::workers::job_runner::start_job_worker;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

/// A validated job waiting for the worker.
pub(crate) struct QueuedJob {
    pub id: Uuid,
    pub descriptor: JobDescriptor,
    pub cancel: CancellationToken,
    pub reply: oneshot::Sender<JobOutcome>,
}

/// Caller's side of one submission.
pub struct JobHandle {
    id: Uuid,
    rx: oneshot::Receiver<JobOutcome>,
    cancel: CancellationToken,
}

impl JobHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stops the job. A queued job fails without side effects; a running one
    /// has its current step dropped and its scratch file removed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn wait(self) -> JobOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err(JobError::DispatcherClosed))
    }
}

/// Single-worker FIFO queue in front of the executors.
///
/// Cloning is cheap; every clone feeds the same worker.
#[derive(Clone)]
pub struct Dispatcher {
    tx: async_channel::Sender<QueuedJob>,
    events: broadcast::Sender<JobEvent>,
    root: CancellationToken,
    sink: UploadSink,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Dispatcher {
    /// Spawns the worker. Must be called inside a tokio runtime.
    pub fn start(ctx: JobContext) -> Self {
        let (tx, rx) = async_channel::unbounded();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let sink = ctx.sink.clone();

        let worker = tokio::spawn(start_job_worker(ctx, rx, events.clone()));

        Self {
            tx,
            events,
            root: CancellationToken::new(),
            sink,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    pub fn uploads_enabled(&self) -> bool {
        self.sink.is_configured()
    }

    /// Jobs waiting behind the one currently running.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Validates and enqueues a job. Rejected jobs resolve immediately and
    /// never reach the worker.
    pub fn submit(&self, request: JobRequest) -> JobHandle {
        let id = Uuid::new_v4();
        let (reply, rx) = oneshot::channel();
        let cancel = self.root.child_token();
        let handle = JobHandle {
            id,
            rx,
            cancel: cancel.clone(),
        };

        let descriptor = match self.admit(request) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("Rejected job {}: {}", id, e);
                let _ = reply.send(Err(e));
                return handle;
            }
        };

        let operation = descriptor.operation.kind();
        let _ = self.events.send(JobEvent::Queued {
            job_id: id,
            operation,
        });

        let queued = QueuedJob {
            id,
            descriptor,
            cancel,
            reply,
        };
        if let Err(e) = self.tx.try_send(queued) {
            warn!("Dispatcher closed, dropping job {}", id);
            let _ = self.events.send(JobEvent::Finished {
                job_id: id,
                success: false,
            });
            let _ = e.into_inner().reply.send(Err(JobError::DispatcherClosed));
            return handle;
        }

        info!("📥 Queued {} job {} ({} pending)", operation, id, self.pending());
        handle
    }

    /// Like [`submit`](Self::submit), delivering the outcome to `handler`.
    pub fn submit_with<F>(&self, request: JobRequest, handler: F) -> Uuid
    where
        F: FnOnce(JobOutcome) + Send + 'static,
    {
        let handle = self.submit(request);
        let id = handle.id();
        tokio::spawn(async move { handler(handle.wait().await) });
        id
    }

    fn admit(&self, request: JobRequest) -> Result<JobDescriptor, JobError> {
        let descriptor = JobDescriptor::try_from(request)?;
        if let Some(destination) = &descriptor.destination {
            self.sink.check(destination)?;
        }
        Ok(descriptor)
    }

    /// Stops intake, lets the backlog drain, and waits for the worker.
    pub async fn shutdown(&self) {
        self.tx.close();
        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(e) = worker.await {
                warn!("Job worker ended abnormally: {}", e);
            }
        }
    }

    /// Cancels the running job and everything queued, then shuts down.
    pub async fn abort(&self) {
        self.root.cancel();
        self.shutdown().await;
    }
}
