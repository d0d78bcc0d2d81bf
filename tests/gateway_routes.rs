//! Middleware chain behaviour, exercised in-process.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use front_door::collaborators::{NoSession, ProviderConfigurator};
use front_door::http::middleware::cors;
use front_door::http::{MiddlewareStack, X_REQUEST_ID};
use front_door::security::RateLimiter;
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::{get_from, test_config, LoginProvider, TaggingSession};

async fn app(points: u32, enabled: bool, login: &LoginProvider) -> Router {
    let mut config = test_config(3000, points);
    config.rate_limit.enabled = enabled;
    let limiter = enabled.then(|| Arc::new(RateLimiter::new(points, Duration::from_secs(60))));
    let stack = MiddlewareStack::new(&config, limiter, Arc::new(NoSession));
    let routes = login.configure(Router::new(), "http://localhost:3000/").await.unwrap();
    stack.wrap(routes)
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_liveness_probe() {
    let login = LoginProvider::default();
    let app = app(5, true, &login).await;

    let res = app.oneshot(get_from("/livenessprobe", "10.0.0.1:4000")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], cors::ALLOW_ORIGIN);

    let body = json(res).await;
    assert_eq!(body["success"], "true");
    assert_eq!(body["hostname"], "test-node");
}

#[tokio::test]
async fn test_cors_headers_on_every_response() {
    let login = LoginProvider::default();
    let app = app(5, true, &login).await;

    for path in ["/auth/login", "/livenessprobe", "/missing"] {
        let res = app.clone().oneshot(get_from(path, "10.0.0.1:4000")).await.unwrap();
        let headers = res.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*", "{}", path);
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS, PUT, PATCH, DELETE"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "X-Requested-With,content-type"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}

#[tokio::test]
async fn test_rejected_requests_never_reach_providers() {
    let login = LoginProvider::default();
    let app = app(2, true, &login).await;

    for _ in 0..2 {
        let res = app.clone().oneshot(get_from("/auth/login", "10.0.0.1:4000")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app.clone().oneshot(get_from("/auth/login", "10.0.0.1:4000")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(json(res).await, serde_json::json!({ "response": "RATE_LIMIT" }));

    assert_eq!(login.hits(), 2);
}

#[tokio::test]
async fn test_liveness_ignores_exhausted_budget() {
    let login = LoginProvider::default();
    let app = app(1, true, &login).await;

    app.clone().oneshot(get_from("/auth/login", "10.0.0.1:4000")).await.unwrap();
    let res = app.clone().oneshot(get_from("/auth/login", "10.0.0.1:4000")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    let res = app.oneshot(get_from("/livenessprobe", "10.0.0.1:4000")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unmatched_routes_are_gated_too() {
    let login = LoginProvider::default();
    let app = app(1, true, &login).await;

    let res = app.clone().oneshot(get_from("/nowhere", "10.0.0.9:4000")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = app.oneshot(get_from("/nowhere", "10.0.0.9:4000")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_forwarded_clients_get_separate_budgets() {
    let login = LoginProvider::default();
    let app = app(1, true, &login).await;

    let behind_proxy = |client: &str| {
        let mut req = get_from("/auth/login", "10.0.0.254:4000");
        req.headers_mut().insert("x-real-ip", client.parse().unwrap());
        req
    };

    assert_eq!(app.clone().oneshot(behind_proxy("203.0.113.1")).await.unwrap().status(), StatusCode::OK);
    assert_eq!(app.clone().oneshot(behind_proxy("203.0.113.2")).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        app.oneshot(behind_proxy("203.0.113.1")).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(login.hits(), 2);
}

#[tokio::test]
async fn test_disabled_gate_never_rejects() {
    let login = LoginProvider::default();
    let app = app(1, false, &login).await;

    for _ in 0..5 {
        let res = app.clone().oneshot(get_from("/auth/login", "10.0.0.1:4000")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert_eq!(login.hits(), 5);
}

#[tokio::test]
async fn test_request_id_generated_and_preserved() {
    let login = LoginProvider::default();
    let app = app(5, true, &login).await;

    let res = app.clone().oneshot(get_from("/auth/login", "10.0.0.1:4000")).await.unwrap();
    let generated = res.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());

    let mut req = get_from("/auth/login", "10.0.0.1:4000");
    req.headers_mut().insert(X_REQUEST_ID, "upstream-42".parse().unwrap());
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.headers()[X_REQUEST_ID], "upstream-42");
}

#[tokio::test]
async fn test_cookies_reach_provider_handlers() {
    let login = LoginProvider::default();
    let app = app(5, true, &login).await;

    let mut req = get_from("/auth/whoami", "10.0.0.1:4000");
    req.headers_mut().insert(header::COOKIE, "theme=dark; session=abc".parse().unwrap());
    let res = app.oneshot(req).await.unwrap();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"abc");
}

#[tokio::test]
async fn test_session_middleware_wraps_gated_routes() {
    let login = LoginProvider::default();
    let config = test_config(3000, 5);
    let stack = MiddlewareStack::new(&config, None, Arc::new(TaggingSession));
    let routes = login.configure(Router::new(), "http://localhost:3000/").await.unwrap();
    let app = stack.wrap(routes);

    let res = app.clone().oneshot(get_from("/auth/login", "10.0.0.1:4000")).await.unwrap();
    assert_eq!(res.headers()["x-session-cookie"], "session");

    let res = app.oneshot(get_from("/livenessprobe", "10.0.0.1:4000")).await.unwrap();
    assert!(!res.headers().contains_key("x-session-cookie"));
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let login = LoginProvider::default();
    let mut config = test_config(3000, 5);
    config.server.max_body_bytes = 16;
    let stack = MiddlewareStack::new(&config, None, Arc::new(NoSession));
    let routes = login.configure(Router::new(), "http://localhost:3000/").await.unwrap();
    let app = stack.wrap(routes);

    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_LENGTH, "64")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
