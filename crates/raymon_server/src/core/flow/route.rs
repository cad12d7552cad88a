use crate::core::flow::schema::FlowResult;
use crate::core::state::AppState;
use axum::extract::State;
use axum::Json;
use raymon_client::validate_input;
use raymon_error::error::{EntryError, SetupError};
use raymon_settings::config::ClusterEndpoint;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run the user step with submitted input.
///
/// Validation failures re-show the form with a `base` error. A validated
/// endpoint becomes a loaded config entry.
pub async fn async_step_user(state: &AppState, user_input: ClusterEndpoint) -> FlowResult {
    if let Err(e) = user_input.validate() {
        warn!("Rejected setup input: {}", e);
        return FlowResult::form_error("invalid_input");
    }

    if state.entries.is_configured(&user_input) {
        info!("{} is already configured", user_input.unique_id());
        return FlowResult::form_error("already_configured");
    }

    let info = match validate_input(&user_input, state.config.request_timeout()).await {
        Ok(info) => info,
        Err(e) => {
            if let SetupError::CannotConnect { .. } = e {
                info!("Cannot connect to {}: {}", user_input.summary_url(), e);
            }
            return FlowResult::form_error(e.kind());
        }
    };

    match state.entries.setup_entry(&info.title, &user_input).await {
        Ok(entry) => FlowResult::CreateEntry {
            title: info.title,
            entry,
        },
        Err(e @ EntryError::AlreadyConfigured(_)) => {
            info!("{}", e);
            FlowResult::form_error("already_configured")
        }
        Err(e) => {
            error!("Failed to set up entry {}: {}", info.title, e);
            FlowResult::form_error("cannot_connect")
        }
    }
}

pub async fn show_user_form() -> Json<FlowResult> {
    Json(FlowResult::form(BTreeMap::new()))
}

pub async fn submit_user_form(
    State(state): State<Arc<AppState>>,
    Json(user_input): Json<ClusterEndpoint>,
) -> Json<FlowResult> {
    Json(async_step_user(&state, user_input).await)
}
