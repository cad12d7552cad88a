use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, serde::Serialize)]
pub enum ServerError {
    #[error("Server failure: {0}")]
    Error(String),

    #[error("Config entry not found: {0}")]
    EntryNotFound(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Error(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::EntryNotFound(_) | ServerError::EntityNotFound(_) => {
                StatusCode::NOT_FOUND
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
