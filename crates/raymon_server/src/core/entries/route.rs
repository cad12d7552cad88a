use crate::core::entries::schema::{EntryListResponse, UnloadResponse};
use crate::core::error::ServerError;
use crate::core::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

pub async fn list_entries(State(state): State<Arc<AppState>>) -> Json<EntryListResponse> {
    Json(EntryListResponse {
        entries: state.entries.list(),
    })
}

pub async fn unload_entry(
    State(state): State<Arc<AppState>>,
    Path(entry_id): Path<String>,
) -> Result<Json<UnloadResponse>, ServerError> {
    let removed_entities = state.entries.unload_entry(&entry_id).await?;

    Ok(Json(UnloadResponse {
        entry_id,
        removed_entities,
    }))
}
