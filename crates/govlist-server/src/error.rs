use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Listing(#[from] govlist_core::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Listing(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Listing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!("Listing request failed: {}", message);
        } else {
            warn!("Rejected listing request: {}", message);
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}
