//! Sequential video job queue: transcodes or captures still frames with an
//! external encoder, one job at a time, optionally uploading the result to
//! an object store.

pub mod app;
pub mod common;
pub mod config;
pub mod infrastructure;
pub mod modules;
pub mod routes;
pub mod state;
pub mod workers;

pub use modules::jobs::context::{JobContext, StepTimeouts};
pub use modules::jobs::dispatcher::{Dispatcher, JobHandle};
pub use modules::jobs::dto::{
    Destination, JobOutcome, JobOutput, JobRequest, JobResult, LocalArtifact, OperationKind,
    OperationRequest,
};
pub use modules::jobs::error::{JobError, Step};
pub use modules::jobs::events::JobEvent;
