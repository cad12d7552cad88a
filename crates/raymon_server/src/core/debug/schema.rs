use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct DebugInfo {
    pub app_name: String,
    pub app_env: String,
    pub app_version: String,
    pub entries: usize,
    pub entities: usize,
}

impl DebugInfo {
    pub fn new(
        app_name: String,
        app_env: String,
        app_version: String,
        entries: usize,
        entities: usize,
    ) -> Self {
        Self {
            app_name,
            app_env,
            app_version,
            entries,
            entities,
        }
    }
}

impl IntoResponse for DebugInfo {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}
