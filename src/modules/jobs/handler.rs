use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::jobs::dto::JobRequest;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

/// Queues the job and answers once it has finished.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(req): Json<JobRequest>,
) -> impl IntoResponse {
    let handle = state.dispatcher.submit(req);
    info!("Job {} submitted over HTTP", handle.id());

    match handle.wait().await {
        Ok(res) => ApiSuccess(
            ApiResponse::success(res, "Job completed successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
