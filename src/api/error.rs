use crate::platform::PlatformError;
use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with; rendered as `{ "error": message }`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid upload: {}", e.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Platform(e) => match e {
                PlatformError::Validation(_)
                | PlatformError::MissingFields(_)
                | PlatformError::InvalidStatus => StatusCode::BAD_REQUEST,
                PlatformError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                PlatformError::RegistrationClosed | PlatformError::UploadsDisabled => {
                    StatusCode::FORBIDDEN
                }
                PlatformError::NotFound(_) => StatusCode::NOT_FOUND,
                PlatformError::AlreadyRegistered => StatusCode::CONFLICT,
                PlatformError::Database(_)
                | PlatformError::Storage(_)
                | PlatformError::Auth(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Details go to the log, not to the client
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
