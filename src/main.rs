use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use video_queue::app;
use video_queue::config::settings::AppConfig;
use video_queue::infrastructure::encoder::ffmpeg::FfmpegEncoder;
use video_queue::infrastructure::scratch::ScratchSpace;
use video_queue::infrastructure::storage::ObjectStore;
use video_queue::infrastructure::storage::s3::StorageService;
use video_queue::state::AppState;
use video_queue::{Dispatcher, JobContext, StepTimeouts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting video queue...");

    let config = AppConfig::new();

    let scratch = ScratchSpace::from_config(config.work_dir.clone());
    scratch.prepare().await.with_context(|| {
        format!(
            "failed to create working directory {}",
            scratch.dir().display()
        )
    })?;

    let store = match &config.storage {
        Some(storage) => Some(Arc::new(StorageService::new(storage)) as Arc<dyn ObjectStore>),
        None => {
            warn!("⚠️ No object store credentials, jobs with a destination will be rejected");
            None
        }
    };

    let encoder = Arc::new(FfmpegEncoder::new(&config.ffmpeg_path));
    let ctx = JobContext::new(scratch, encoder, store).with_timeouts(StepTimeouts {
        encode: config.encode_timeout(),
        upload: config.upload_timeout(),
    });

    let dispatcher = Dispatcher::start(ctx);
    let state = AppState::new(config.clone(), dispatcher.clone());
    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Draining job queue...");
    dispatcher.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
