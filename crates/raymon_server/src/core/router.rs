use crate::core::debug::route::debug_info;
use crate::core::entities::route::{get_entity, list_entities};
use crate::core::entries::route::{list_entries, unload_entry};
use crate::core::flow::route::{show_user_form, submit_user_form};
use crate::core::health::route::health_check;
use crate::core::state::AppState;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub const ROUTE_PREFIX: &str = "/raymon";

pub async fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    Router::new()
        .route(&format!("{}/healthcheck", ROUTE_PREFIX), get(health_check))
        .route(&format!("{}/debug", ROUTE_PREFIX), get(debug_info))
        .route(
            &format!("{}/flow/user", ROUTE_PREFIX),
            get(show_user_form).post(submit_user_form),
        )
        .route(&format!("{}/entries", ROUTE_PREFIX), get(list_entries))
        .route(
            &format!("{}/entries/:entry_id", ROUTE_PREFIX),
            delete(unload_entry),
        )
        .route(&format!("{}/entities", ROUTE_PREFIX), get(list_entities))
        .route(
            &format!("{}/entities/:unique_id", ROUTE_PREFIX),
            get(get_entity),
        )
        .with_state(app_state)
        .layer(cors)
}
