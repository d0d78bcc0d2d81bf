//! Startup orchestration.
//!
//! # States
//! ```text
//! Initializing → MiddlewareInstalled → ProvidersConfigured → ListenerBound → Serving
//!       └──────────────┴───────────────────┴──────────────────────┴──→ Failed
//! ```
//!
//! # Design Decisions
//! - Ordered startup: middleware, then providers, then TLS, data store, bind
//! - Any failure is logged once, inside the bootstrap span, and turned
//!   into `None`; the process supervisor decides what happens next
//! - The rate limiter is created here and injected, never global

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tracing::Instrument;

use crate::collaborators::{Collaborators, DataStoreError, ProviderError};
use crate::config::AppConfig;
use crate::http::MiddlewareStack;
use crate::net::listener::{create_listener, ListenerError, ServerHandle};
use crate::net::tls::{self, TlsError};
use crate::observability::metrics;
use crate::security::rate_limit::RateLimiter;

/// Where the bootstrap sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    Initializing,
    MiddlewareInstalled,
    ProvidersConfigured,
    ListenerBound,
    Serving,
    Failed,
}

/// Why the bootstrap sequence stopped.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("invalid TLS material: {0}")]
    Credential(#[from] TlsError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    DataStore(#[from] DataStoreError),

    #[error("{0}")]
    Listener(#[source] ListenerError),

    #[error("server is already serving")]
    AlreadyServing,
}

impl From<ListenerError> for BootstrapError {
    fn from(e: ListenerError) -> Self {
        match e {
            ListenerError::Tls(tls) => BootstrapError::Credential(tls),
            other => BootstrapError::Listener(other),
        }
    }
}

/// Runs the startup sequence once and owns the shared rate limiter.
pub struct ServerBootstrap {
    config: Arc<AppConfig>,
    collaborators: Collaborators,
    limiter: Option<Arc<RateLimiter>>,
    stage: BootstrapStage,
}

impl ServerBootstrap {
    pub fn new(config: Arc<AppConfig>, collaborators: Collaborators) -> Self {
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit)));
        Self {
            config,
            collaborators,
            limiter,
            stage: BootstrapStage::Initializing,
        }
    }

    pub fn stage(&self) -> BootstrapStage {
        self.stage
    }

    /// The limiter behind the gate, if rate limiting is enabled.
    pub fn rate_limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.limiter.as_ref()
    }

    /// Run the whole sequence. Failures are logged and reported as `None`.
    pub async fn configure(&mut self, base_url: &str) -> Option<ServerHandle> {
        let span = tracing::info_span!(
            "front_door.bootstrap",
            base_url = %base_url,
            port = self.config.listener.port,
        );

        match self.try_configure(base_url).instrument(span.clone()).await {
            Ok(handle) => {
                metrics::record_bootstrap("serving");
                Some(handle)
            }
            Err(e) => {
                span.in_scope(|| {
                    tracing::error!(
                        stage = ?self.stage,
                        error = %e,
                        cause = ?std::error::Error::source(&e).map(|s| s.to_string()),
                        "Bootstrap failed, server unavailable"
                    );
                });
                if !matches!(e, BootstrapError::AlreadyServing) {
                    self.stage = BootstrapStage::Failed;
                }
                metrics::record_bootstrap("failed");
                None
            }
        }
    }

    /// Run the whole sequence and return the typed failure.
    pub async fn try_configure(&mut self, base_url: &str) -> Result<ServerHandle, BootstrapError> {
        if self.stage == BootstrapStage::Serving {
            return Err(BootstrapError::AlreadyServing);
        }
        self.stage = BootstrapStage::Initializing;
        let config = Arc::clone(&self.config);

        let tls_config = &config.listener.tls;
        if !tls_config.is_enabled()
            && (!tls_config.certificate.is_empty() || !tls_config.private_key.is_empty())
        {
            tracing::warn!("TLS certificate or key missing, serving plaintext");
        }

        let stack = MiddlewareStack::new(
            &config,
            self.limiter.clone(),
            Arc::clone(&self.collaborators.session),
        );
        tracing::info!(
            rate_limited = stack.rate_limited(),
            points = config.rate_limit.points,
            duration_secs = config.rate_limit.duration_secs,
            hostname = %stack.hostname(),
            "Middleware installed"
        );
        self.advance(BootstrapStage::MiddlewareInstalled);

        let login = Arc::clone(&self.collaborators.login);
        let sso = Arc::clone(&self.collaborators.sso);
        tracing::info!(provider = %login.name(), "Configuring login provider");
        let surface = login.configure(Router::new(), base_url).await?;
        tracing::info!(provider = %sso.name(), "Configuring SSO provider");
        let surface = sso.configure(surface, base_url).await?;
        let app = stack.wrap(surface);
        self.advance(BootstrapStage::ProvidersConfigured);

        let credential = tls::materialize_config(tls_config)?;
        if let Some(credential) = &credential {
            credential.to_der()?;
        }
        self.collaborators.store.connect().await?;
        tracing::debug!("Data store connected");

        let handle = create_listener(&config.listener, credential, app).await?;
        self.advance(BootstrapStage::ListenerBound);

        if let Some(limiter) = &self.limiter {
            Arc::clone(limiter).spawn_sweeper(
                Duration::from_secs(config.rate_limit.sweep_interval_secs),
                handle.shutdown_signal(),
            );
        }

        self.advance(BootstrapStage::Serving);
        tracing::info!(
            address = %handle.local_addr(),
            tls = handle.is_secure(),
            "Serving"
        );
        Ok(handle)
    }

    fn advance(&mut self, next: BootstrapStage) {
        tracing::debug!(from = ?self.stage, to = ?next, "Bootstrap stage");
        self.stage = next;
    }
}
