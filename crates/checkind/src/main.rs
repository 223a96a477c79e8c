use anyhow::{Context, Result};
use checkin_core::ThumbnailEncoder;
use checkind::config::Config;
use checkind::engine::spawn_engine;
use checkind::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkind=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("checkind starting");

    let config = Config::from_env();
    tracing::info!(
        addr = %config.listen_addr(),
        similarity_threshold = config.similarity_threshold,
        max_upload_bytes = config.max_upload_bytes,
        "configuration loaded"
    );

    let engine = spawn_engine(ThumbnailEncoder).context("failed to start face engine")?;
    let state = AppState::new(engine, config.similarity_threshold);
    let app = checkind::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    tracing::info!(addr = %config.listen_addr(), "checkind ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    tracing::info!("checkind shutting down");
    Ok(())
}
