use crate::state::AppState;
use axum::Router;
use axum::routing::post;

pub mod context;
pub mod dispatcher;
pub mod dto;
pub mod error;
pub mod events;
pub mod executors;
pub mod handler;
pub mod sink;

pub fn router() -> Router<AppState> {
    Router::new().route("/jobs", post(handler::submit_job))
}
