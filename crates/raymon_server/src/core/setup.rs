use crate::core::cli::Cli;
use crate::core::flow::route::async_step_user;
use crate::core::flow::schema::FlowResult;
use crate::core::state::AppState;
use anyhow::{bail, Context, Result as AnyhowResult};
use raymon_logging::logging::setup_logging;
use raymon_settings::config::RaymonConfig;
use raymon_utils::color::LogColors;
use std::sync::Arc;
use tracing::info;

pub async fn setup_components(cli: Cli) -> AnyhowResult<Arc<AppState>> {
    let config = cli.apply(RaymonConfig::default());

    setup_logging()
        .await
        .context(LogColors::alert("Failed to setup logging"))?;

    info!("Starting raymon {} ....", config.app_version);

    let startup_endpoint = config.startup_endpoint();
    let state = Arc::new(AppState::new(config));

    if let Some(endpoint) = startup_endpoint {
        // same path as the setup form, so a bad host fails loudly here
        match async_step_user(&state, endpoint.clone()).await {
            FlowResult::CreateEntry { title, entry } => {
                info!(
                    "Registered {} as entry {}",
                    LogColors::blue(&title),
                    LogColors::green(&entry.entry_id)
                );
            }
            FlowResult::Form { errors, .. } => {
                let kind = errors.get("base").cloned().unwrap_or_default();
                bail!(LogColors::alert(&format!(
                    "Failed to register {}: {}",
                    endpoint.summary_url(),
                    kind
                )));
            }
        }
    }

    Ok(state)
}
