use crate::state::AppState;
use axum::extract::State;
use axum::{Json, Router};
use serde_json::{Value, json};

use tower_http::cors::{Any, CorsLayer};

pub fn configure_routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes().merge(crate::modules::jobs::router()))
        .layer(cors)
}

fn api_routes() -> Router<AppState> {
    Router::new().route("/health", axum::routing::get(health))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "pending_jobs": state.dispatcher.pending(),
        "uploads_enabled": state.dispatcher.uploads_enabled(),
        "ffmpeg": state.config.ffmpeg_path,
    }))
}
