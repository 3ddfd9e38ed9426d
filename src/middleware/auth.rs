use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError, utils::token_prefix};

/// Header carrying the token on protected routes.
pub const AUTH_HEADER: &str = "Authentication";

pub async fn require_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|header| header.to_str().ok())
        .unwrap_or_default();

    if !state.tokens.is_authorized(token) {
        tracing::debug!(token = token_prefix(token), "rejected token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
