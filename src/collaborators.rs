//! Seams to the systems the gateway delegates to.
//!
//! Authentication flows, the backing data store and cookie-session encoding
//! live outside this crate. The bootstrap only needs to hand them the router
//! surface, wait for the store to connect, and layer the session middleware.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use crate::config::schema::SessionConfig;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error raised by a provider configurator.
#[derive(Debug, thiserror::Error)]
#[error("provider {provider} failed to configure: {source}")]
pub struct ProviderError {
    pub provider: String,
    #[source]
    pub source: BoxError,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            provider: provider.into(),
            source: source.into(),
        }
    }
}

/// Error raised while connecting the data store.
#[derive(Debug, thiserror::Error)]
#[error("data store connection failed: {0}")]
pub struct DataStoreError(#[source] pub BoxError);

/// Registers an authentication provider's routes on the shared surface.
#[async_trait]
pub trait ProviderConfigurator: Send + Sync {
    /// Short name used in logs ("login", "sso").
    fn name(&self) -> &str;

    /// Add this provider's routes to `router`. `base_url` is the public
    /// URL of the gateway, used for callback and redirect targets.
    async fn configure(&self, router: Router, base_url: &str) -> Result<Router, ProviderError>;
}

/// Backing store that must be reachable before the listener binds.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn connect(&self) -> Result<(), DataStoreError>;
}

/// Session cookie and flash message support.
///
/// Implementations wrap `router` in their layers; requests pass through
/// them after cookie parsing and before the rate-limit gate.
pub trait SessionMiddleware: Send + Sync {
    fn install(&self, router: Router, config: &SessionConfig) -> Router;
}

/// Provider that registers nothing. Used when a deployment has no such provider.
#[derive(Debug, Clone)]
pub struct DisabledProvider {
    name: String,
}

impl DisabledProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ProviderConfigurator for DisabledProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn configure(&self, router: Router, _base_url: &str) -> Result<Router, ProviderError> {
        tracing::info!(provider = %self.name, "Provider disabled, no routes registered");
        Ok(router)
    }
}

/// Data store with nothing to connect to.
#[derive(Debug, Clone, Default)]
pub struct NoopDataStore;

#[async_trait]
impl DataStore for NoopDataStore {
    async fn connect(&self) -> Result<(), DataStoreError> {
        Ok(())
    }
}

/// Leaves the router untouched.
#[derive(Debug, Clone, Default)]
pub struct NoSession;

impl SessionMiddleware for NoSession {
    fn install(&self, router: Router, _config: &SessionConfig) -> Router {
        router
    }
}

/// Everything the bootstrap delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub login: Arc<dyn ProviderConfigurator>,
    pub sso: Arc<dyn ProviderConfigurator>,
    pub store: Arc<dyn DataStore>,
    pub session: Arc<dyn SessionMiddleware>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            login: Arc::new(DisabledProvider::new("login")),
            sso: Arc::new(DisabledProvider::new("sso")),
            store: Arc::new(NoopDataStore),
            session: Arc::new(NoSession),
        }
    }
}
