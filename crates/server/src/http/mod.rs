use axum::{Router, extract::Request, middleware::from_fn_with_state, routing::get};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{DeploymentImpl, routes};

pub mod auth;
pub mod extract;
pub mod session;

fn request_span(request: &Request) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

pub fn router(deployment: DeploymentImpl) -> Router {
    let protected_routes = Router::new()
        .merge(routes::tasks::router(&deployment))
        .merge(routes::users::router())
        .layer(from_fn_with_state(
            deployment.clone(),
            auth::require_session,
        ));

    let api_routes = Router::new()
        .route("/ping", get(routes::health::health_check))
        .merge(routes::auth::router())
        .merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(deployment)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode, header};
    use utils_jwt::{AccessClaims, TokenKeys};

    use crate::test_support::{TEST_SECRET, TestApp, assert_status, json_body, set_cookie};

    #[tokio::test]
    async fn health_and_ping_are_public() {
        let app = TestApp::new().await;

        let response = app.send(Method::GET, "/health", None, None).await;
        assert_status(&response, StatusCode::OK);

        let response = app.send(Method::GET, "/api/ping", None, None).await;
        assert_status(&response, StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json.get("data").and_then(|v| v.as_str()), Some("OK"));
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let app = TestApp::new().await;

        let response = app.send(Method::GET, "/health", None, None).await;

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .unwrap();
        assert!(uuid::Uuid::parse_str(request_id).is_ok());
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_token_and_clear_cookie() {
        let app = TestApp::new().await;

        for (method, uri) in [
            (Method::GET, "/api/tasks"),
            (Method::POST, "/api/tasks"),
            (Method::GET, "/api/teams"),
            (Method::GET, "/api/users/me"),
        ] {
            let response = app.send(method, uri, None, None).await;
            assert_status(&response, StatusCode::UNAUTHORIZED);

            let cookie = set_cookie(&response).unwrap();
            assert!(cookie.starts_with("access_token=;"));
            assert!(cookie.contains("Max-Age=0"));

            let json = json_body(response).await;
            assert_eq!(json.get("success").and_then(|v| v.as_bool()), Some(false));
            assert_eq!(
                json.get("message").and_then(|v| v.as_str()),
                Some("Unauthorized")
            );
        }
    }

    #[tokio::test]
    async fn tokens_from_another_secret_or_issuer_are_rejected() {
        let app = TestApp::new().await;
        let ttl = chrono::Duration::minutes(5);

        let foreign_secret = TokenKeys::new(b"another-secret", "taskboard", ttl)
            .issue(app.lead.id, app.lead.role)
            .unwrap();
        let foreign_issuer = TokenKeys::new(TEST_SECRET.as_bytes(), "elsewhere", ttl)
            .issue(app.lead.id, app.lead.role)
            .unwrap();
        let expired = app
            .deployment
            .tokens()
            .sign(&AccessClaims::new(
                app.lead.id,
                app.lead.role,
                "taskboard",
                chrono::Duration::minutes(-10),
            ))
            .unwrap();

        for token in [foreign_secret, foreign_issuer, expired, "garbage".to_string()] {
            let request = axum::http::Request::builder()
                .uri("/api/tasks")
                .header(header::COOKIE, format!("access_token={token}"))
                .body(axum::body::Body::empty())
                .unwrap();
            let response = tower::ServiceExt::oneshot(app.router(), request).await.unwrap();

            assert_status(&response, StatusCode::UNAUTHORIZED);
            assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
        }
    }

    #[tokio::test]
    async fn bearer_header_is_accepted() {
        let app = TestApp::new().await;

        let request = axum::http::Request::builder()
            .uri("/api/users/me")
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", app.token_for(&app.team)),
            )
            .body(axum::body::Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(app.router(), request).await.unwrap();

        assert_status(&response, StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(
            json.pointer("/data/id").and_then(|v| v.as_str()),
            Some(app.team.id.to_string().as_str())
        );
    }
}
