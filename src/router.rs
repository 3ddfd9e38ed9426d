use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    middleware::{log_errors, require_token},
    routes,
};

// 需要令牌的路由
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/hello", get(routes::token::hello))
        .route_layer(from_fn_with_state(state, require_token))
}

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(routes::token::login))
        .route("/health", get(routes::health::health))
        .merge(protected_routes(state.clone()))
        .layer(from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtSigner, TokenService};
    use crate::config::Config;
    use crate::middleware::AUTH_HEADER;
    use crate::reclaim::ReclaimPolicy;
    use crate::routes::token::LoginResponse;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = Config::from_lookup(|key| (key == "JWT_SECRET").then(|| "test-key".to_string()))
            .unwrap();
        let tokens = TokenService::new(
            Arc::new(JwtSigner::new(config.jwt_secret.as_bytes())),
            ReclaimPolicy::Deferred,
            config.token_ttl(),
        );
        AppState {
            config,
            tokens: Arc::new(tokens),
        }
    }

    fn login_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .body(Body::from(body))
            .unwrap()
    }

    fn hello_request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/hello");
        if let Some(token) = token {
            builder = builder.header(AUTH_HEADER, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn login_then_hello_succeeds() {
        let state = test_state();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(login_request(r#"{"user":"alice","password":"pw"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let login: LoginResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!login.token.is_empty());
        assert!(login.time_to_live > chrono::Utc::now());

        let response = app.oneshot(hello_request(Some(&login.token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn time_to_live_is_rfc3339() {
        let app = create_router(test_state());
        let response = app
            .oneshot(login_request(r#"{"user":"alice","password":"pw"}"#))
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let raw = json["time_to_live"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(raw).is_ok());
    }

    #[tokio::test]
    async fn malformed_login_is_bad_request() {
        let state = test_state();
        let app = create_router(state.clone());

        for body in [r#"{"bogus":1}"#, "not json", ""] {
            let response = app.clone().oneshot(login_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body:?}");
        }
        assert_eq!(state.tokens.active_tokens(), 0);
    }

    #[tokio::test]
    async fn hello_rejects_missing_and_unknown_tokens() {
        let app = create_router(test_state());

        let response = app.clone().oneshot(hello_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(hello_request(Some("forged"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_reports_active_tokens() {
        let state = test_state();
        let app = create_router(state.clone());
        app.clone()
            .oneshot(login_request(r#"{"user":"alice","password":"pw"}"#))
            .await
            .unwrap();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["active_tokens"], 1);
    }
}
