use anyhow::Context;
use tracing_subscriber::EnvFilter;

use neonmaze_server::build_app;
use neonmaze_server::config::ServerConfig;
use neonmaze_server::game_loop::GameCommand;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("neonmaze server starting");

    let config = ServerConfig::load();
    config.validate().context("invalid configuration")?;
    let addr = config.listen_addr.clone();

    let (app, state, loop_handle) = build_app(config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let _ = state.commands.send(GameCommand::Stop);
    loop_handle.await.context("game loop panicked")?;
    tracing::info!("neonmaze server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("NEONMAZE_LOG_JSON").is_ok_and(|v| v == "1") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
