use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use raymon_server::core::cli::Cli;
use raymon_server::core::router::create_router;
use raymon_server::core::setup::setup_components;
use raymon_utils::color::LogColors;
use tracing::info;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    let cli = Cli::parse();
    let app_state = setup_components(cli).await?;
    let app = create_router(app_state.clone()).await;

    let listener = tokio::net::TcpListener::bind(&app_state.config.bind_addr)
        .await
        .with_context(|| {
            LogColors::alert(&format!("Failed to bind {}", app_state.config.bind_addr))
        })?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(LogColors::alert("Server error"))?;

    app_state.entries.unload_all().await;
    info!("Shut down");

    Ok(())
}
