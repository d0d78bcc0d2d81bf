//! Router assembly.
//!
//! # Request order
//! ```text
//! request id → access log → timeout → CORS headers → compression → body limit
//!     ├─ GET /livenessprobe (never rate limited)
//!     └─ cookies → session + flash → rate-limit gate → provider routes / static files
//! ```
//!
//! # Design Decisions
//! - The middleware stack is built before providers register, then wrapped
//!   around whatever routes they added
//! - The gate is installed or not at construction; no per-request switch
//! - Unmatched requests still pass the gate before the 404/static fallback

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::collaborators::SessionMiddleware;
use crate::config::schema::{AppConfig, SessionConfig};
use crate::health::{liveness_handler, LivenessState, LIVENESS_PATH};
use crate::http::middleware::{cookie_parser_middleware, cors_headers};
use crate::http::request::UuidRequestId;
use crate::security::client_addr::AddressResolver;
use crate::security::rate_limit::{rate_limit_middleware, RateLimitGate, RateLimiter};

/// The fixed middleware chain, ready to wrap provider routes.
#[derive(Clone)]
pub struct MiddlewareStack {
    gate: Option<RateLimitGate>,
    session: Arc<dyn SessionMiddleware>,
    session_config: SessionConfig,
    liveness: LivenessState,
    static_dir: Option<String>,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl MiddlewareStack {
    /// Prepare the chain. `limiter` is `None` when rate limiting is disabled.
    pub fn new(
        config: &AppConfig,
        limiter: Option<Arc<RateLimiter>>,
        session: Arc<dyn SessionMiddleware>,
    ) -> Self {
        let resolver = AddressResolver::new(config.proxy.trust_forwarded_headers);
        Self {
            gate: limiter.map(|limiter| RateLimitGate { limiter, resolver }),
            session,
            session_config: config.session.clone(),
            liveness: LivenessState::new(config.server.hostname.as_deref()),
            static_dir: config.server.static_dir.clone().filter(|d| !d.is_empty()),
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            max_body_bytes: config.server.max_body_bytes,
        }
    }

    pub fn rate_limited(&self) -> bool {
        self.gate.is_some()
    }

    pub fn hostname(&self) -> &str {
        &self.liveness.hostname
    }

    /// Wrap `routes` (the provider surface) in the full chain.
    #[allow(deprecated)]
    pub fn wrap(self, routes: Router) -> Router {
        let mut gated = match &self.static_dir {
            Some(dir) => routes.fallback_service(ServeDir::new(dir)),
            None => routes.fallback(not_found),
        };

        if let Some(gate) = self.gate {
            gated = gated.layer(middleware::from_fn_with_state(gate, rate_limit_middleware));
        }
        gated = self.session.install(gated, &self.session_config);
        gated = gated.layer(middleware::from_fn(cookie_parser_middleware));

        Router::new()
            .route(LIVENESS_PATH, get(liveness_handler))
            .with_state(self.liveness)
            .merge(gated)
            .layer(RequestBodyLimitLayer::new(self.max_body_bytes))
            .layer(CompressionLayer::new())
            .layer(cors_headers())
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
