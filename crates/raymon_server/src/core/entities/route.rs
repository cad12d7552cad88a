use crate::core::entities::schema::{EntityListResponse, EntityQuery};
use crate::core::error::ServerError;
use crate::core::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use raymon_types::EntityState;
use std::sync::Arc;

pub async fn list_entities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EntityQuery>,
) -> Json<EntityListResponse> {
    let entities = match &params.entry_id {
        Some(entry_id) => state.store.for_entry(entry_id),
        None => state.store.all(),
    }
    .into_iter()
    .filter(|entity| {
        params
            .hostname
            .as_ref()
            .map_or(true, |hostname| &entity.hostname == hostname)
    })
    .collect();

    Json(EntityListResponse { entities })
}

pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path(unique_id): Path<String>,
) -> Result<Json<EntityState>, ServerError> {
    state
        .store
        .get(&unique_id)
        .map(Json)
        .ok_or(ServerError::EntityNotFound(unique_id))
}
