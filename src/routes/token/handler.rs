use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::model::LoginResponse;
use crate::{AppState, auth::Credentials, error::AppError};

#[axum::debug_handler]
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let credentials = Credentials::from_json(&body).inspect_err(|e| {
        tracing::info!(error = %e, "rejected login body");
    })?;
    tracing::debug!(user = %credentials.user, "parsed login request");

    let issued = state.tokens.create_token(&credentials)?;

    // the token is already live; a failure here only loses the response
    let body = serde_json::to_vec(&LoginResponse::from(issued)).map_err(|e| {
        tracing::error!(error = %e, "failed to encode login response");
        AppError::EncodingFailure
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

/// Reached only through `require_token`.
pub async fn hello() -> StatusCode {
    StatusCode::OK
}
