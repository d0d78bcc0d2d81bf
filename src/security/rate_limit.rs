//! Per-client rate limiting and the admission gate middleware.
//!
//! Each client key owns a fixed window of `points` requests lasting
//! `duration`. Requests past the budget are rejected until the window
//! rolls over, at which point the key starts fresh.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use serde_json::json;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::client_addr::AddressResolver;

/// Reason code carried in the body of a rejected request.
pub const RATE_LIMIT_REASON: &str = "RATE_LIMIT";

/// Route label for requests that matched no registered route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Reject(Rejection),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Details of a rejected admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    /// Points consumed in the current window, including this request.
    pub consumed_points: u32,
    /// Points left in the current window (always zero on rejection).
    pub remaining_points: u32,
    /// Milliseconds until the window resets.
    pub ms_before_next: u64,
}

/// One client's window.
#[derive(Debug)]
struct Bucket {
    consumed: u32,
    window_start: Instant,
}

impl Bucket {
    fn new(now: Instant) -> Self {
        Self {
            consumed: 0,
            window_start: now,
        }
    }

    fn expired(&self, now: Instant, duration: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= duration
    }
}

/// Fixed-window rate limiter keyed by client.
///
/// Buckets live in a sharded map; each admission holds its key's shard
/// lock for the whole read-modify-write, so concurrent requests from the
/// same client never lose an increment.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    points: u32,
    duration: Duration,
}

impl RateLimiter {
    pub fn new(points: u32, duration: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            points,
            duration,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.points, Duration::from_secs(config.duration_secs))
    }

    /// Consume one point for `key` now.
    pub fn admit(&self, key: &str) -> Decision {
        self.admit_at(key, Instant::now())
    }

    /// Consume one point for `key` at the given instant.
    pub fn admit_at(&self, key: &str, now: Instant) -> Decision {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(now));

        if bucket.expired(now, self.duration) {
            *bucket = Bucket::new(now);
        }

        bucket.consumed = bucket.consumed.saturating_add(1);
        if bucket.consumed <= self.points {
            return Decision::Allow;
        }

        // A window too long for the clock to represent never ends.
        let wait = match bucket.window_start.checked_add(self.duration) {
            Some(window_end) => window_end.saturating_duration_since(now),
            None => Duration::MAX,
        };
        Decision::Reject(Rejection {
            consumed_points: bucket.consumed,
            remaining_points: self.points.saturating_sub(bucket.consumed),
            // Round up so waiting exactly this long always lands in the next window.
            ms_before_next: u64::try_from(wait.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX),
        })
    }

    /// Points left for `key` in its current window.
    pub fn remaining(&self, key: &str, now: Instant) -> u32 {
        match self.buckets.get(key) {
            Some(bucket) if !bucket.expired(now, self.duration) => {
                self.points.saturating_sub(bucket.consumed)
            }
            _ => self.points,
        }
    }

    /// Drop buckets whose window has elapsed. Returns how many were removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.expired(now, self.duration));
        before.saturating_sub(self.buckets.len())
    }

    /// Number of tracked client keys.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Periodically reclaim idle buckets until shutdown fires.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.sweep_expired(Instant::now());
                        if removed > 0 {
                            tracing::debug!(
                                removed,
                                tracked = self.tracked_keys(),
                                "Reclaimed idle rate-limit buckets"
                            );
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate-limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

/// State for the admission gate.
#[derive(Clone)]
pub struct RateLimitGate {
    pub limiter: Arc<RateLimiter>,
    pub resolver: AddressResolver,
}

/// Middleware that admits or rejects each request before any downstream handler.
pub async fn rate_limit_middleware(
    State(gate): State<RateLimitGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = gate.resolver.resolve(peer, request.headers());

    match gate.limiter.admit(&key) {
        Decision::Allow => next.run(request).await,
        Decision::Reject(rejection) => {
            // Label metrics by route template so arbitrary paths cannot mint new series.
            let route = request
                .extensions()
                .get::<MatchedPath>()
                .map(MatchedPath::as_str)
                .unwrap_or(UNMATCHED_ROUTE);
            tracing::warn!(
                client = %key,
                route = %route,
                path = %request.uri().path(),
                consumed_points = rejection.consumed_points,
                remaining_points = rejection.remaining_points,
                ms_before_next = rejection.ms_before_next,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(route);
            rejection_response(&rejection)
        }
    }
}

/// 429 with the machine-readable reason code.
pub fn rejection_response(rejection: &Rejection) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "response": RATE_LIMIT_REASON })),
    )
        .into_response();
    let retry_after_secs = rejection.ms_before_next.div_ceil(1000).max(1);
    if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}
