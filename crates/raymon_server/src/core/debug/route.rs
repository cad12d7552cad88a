use crate::core::debug::schema::DebugInfo;
use crate::core::state::AppState;
use axum::extract::State;
use std::sync::Arc;

pub async fn debug_info(State(data): State<Arc<AppState>>) -> DebugInfo {
    DebugInfo::new(
        data.config.app_name.clone(),
        data.config.app_env.clone(),
        data.config.app_version.clone(),
        data.entries.len(),
        data.store.len(),
    )
}
