//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{ConnectInfo, Extension},
    http::{HeaderValue, Request},
    routing::get,
    Router,
};
use front_door::collaborators::{
    Collaborators, DataStore, DataStoreError, ProviderConfigurator, ProviderError,
    SessionMiddleware,
};
use front_door::config::schema::SessionConfig;
use front_door::http::middleware::RequestCookies;
use front_door::AppConfig;

/// Grab a port the OS considers free right now.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Loopback config with the given rate-limit budget.
pub fn test_config(port: u16, points: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.port = port;
    config.listener.bind_host = "127.0.0.1".into();
    config.rate_limit.enabled = true;
    config.rate_limit.points = points;
    config.rate_limit.duration_secs = 60;
    config.server.hostname = Some("test-node".into());
    config
}

/// Provider that registers `/auth/login` and counts how often it is reached.
#[derive(Clone, Default)]
pub struct LoginProvider {
    pub hits: Arc<AtomicUsize>,
    pub base_url: Arc<Mutex<Option<String>>>,
}

impl LoginProvider {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderConfigurator for LoginProvider {
    fn name(&self) -> &str {
        "login"
    }

    async fn configure(&self, router: Router, base_url: &str) -> Result<Router, ProviderError> {
        *self.base_url.lock().unwrap() = Some(base_url.to_string());
        let hits = Arc::clone(&self.hits);
        Ok(router
            .route(
                "/auth/login",
                get(move || {
                    let hits = Arc::clone(&hits);
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "login"
                    }
                }),
            )
            .route(
                "/auth/whoami",
                get(|Extension(cookies): Extension<RequestCookies>| async move {
                    cookies.get("session").unwrap_or("anonymous").to_string()
                }),
            ))
    }
}

/// Provider whose configuration always fails.
pub struct BrokenProvider;

#[async_trait]
impl ProviderConfigurator for BrokenProvider {
    fn name(&self) -> &str {
        "sso"
    }

    async fn configure(&self, _router: Router, _base_url: &str) -> Result<Router, ProviderError> {
        Err(ProviderError::new("sso", "identity provider metadata unreachable"))
    }
}

/// Data store that counts connects and can be told to fail.
#[derive(Clone, Default)]
pub struct CountingStore {
    pub connects: Arc<AtomicUsize>,
    pub fail: bool,
}

impl CountingStore {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataStore for CountingStore {
    async fn connect(&self) -> Result<(), DataStoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DataStoreError("connection refused".into()));
        }
        Ok(())
    }
}

/// Session stand-in that tags every response it sees.
pub struct TaggingSession;

impl SessionMiddleware for TaggingSession {
    fn install(&self, router: Router, config: &SessionConfig) -> Router {
        let name = HeaderValue::from_str(&config.cookie_name).unwrap();
        router.layer(axum::middleware::map_response(move |mut res: axum::response::Response| {
            let name = name.clone();
            async move {
                res.headers_mut().insert("x-session-cookie", name);
                res
            }
        }))
    }
}

pub fn collaborators(login: LoginProvider, store: CountingStore) -> Collaborators {
    Collaborators {
        login: Arc::new(login),
        store: Arc::new(store),
        ..Collaborators::default()
    }
}

/// GET request as if it arrived from `peer`.
pub fn get_from(path: &str, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    let mut request = Request::builder().uri(path).body(Body::empty()).unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}
