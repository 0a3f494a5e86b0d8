use super::dto::OperationKind;
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle notifications, broadcast as they happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    Queued {
        job_id: Uuid,
        operation: OperationKind,
    },
    Started {
        job_id: Uuid,
        operation: OperationKind,
    },
    Finished {
        job_id: Uuid,
        success: bool,
    },
}
