use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("malformed credentials: {0}")]
    BadRequest(String),
    #[error("failed to sign token")]
    SigningFailure,
    #[error("failed to encode response")]
    EncodingFailure,
    #[error("missing or unknown token")]
    Unauthorized,
}

#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error_message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::SigningFailure | AppError::EncodingFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            code: status.as_u16(),
            error_message: self.to_string(),
        });

        (status, body).into_response()
    }
}
