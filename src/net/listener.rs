//! Listener construction and the running server handle.
//!
//! # Responsibilities
//! - Bind the configured port (plaintext or rustls)
//! - Report bind failures synchronously to the caller
//! - Serve the router and expose the serve outcome through `ServerHandle`

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use tokio::task::JoinHandle;

use crate::config::ListenerConfig;
use crate::lifecycle::Shutdown;
use crate::net::tls::{TlsCredential, TlsError};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind { address: String, source: std::io::Error },
    /// TLS material could not be turned into a rustls config.
    Tls(TlsError),
    /// The server stopped with an error after binding.
    Serve(std::io::Error),
    /// The serving task panicked or was aborted.
    Task(tokio::task::JoinError),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { address, source } => {
                write!(f, "Failed to bind {}: {}", address, source)
            }
            ListenerError::Tls(e) => write!(f, "Failed to configure TLS: {}", e),
            ListenerError::Serve(e) => write!(f, "Server error: {}", e),
            ListenerError::Task(e) => write!(f, "Server task failed: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
            ListenerError::Tls(e) => Some(e),
            ListenerError::Serve(e) => Some(e),
            ListenerError::Task(e) => Some(e),
        }
    }
}

/// A bound, serving listener.
///
/// Dropping the handle does not stop the server; call [`ServerHandle::shutdown`].
pub struct ServerHandle {
    local_addr: SocketAddr,
    secure: bool,
    handle: Handle,
    shutdown: Shutdown,
    task: Option<JoinHandle<Result<(), std::io::Error>>>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the listener terminates TLS.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Subscribe to the shutdown signal of this server (background tasks).
    pub fn shutdown_signal(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Stop accepting connections and let in-flight requests finish within `grace`.
    pub fn shutdown(&self, grace: Duration) {
        tracing::info!(address = %self.local_addr, grace_secs = grace.as_secs(), "Shutting down listener");
        self.shutdown.trigger();
        self.handle.graceful_shutdown(Some(grace));
    }

    /// Wait for the server to stop and return how it ended.
    ///
    /// Cancel safe. Once the outcome has been returned, later calls return `Ok(())`.
    pub async fn wait(&mut self) -> Result<(), ListenerError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let outcome = task.await;
        self.task = None;
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ListenerError::Serve(e)),
            Err(e) => Err(ListenerError::Task(e)),
        }
    }
}

/// Bind `config` and start serving `router`, over TLS when a credential is given.
pub async fn create_listener(
    config: &ListenerConfig,
    credential: Option<TlsCredential>,
    router: Router,
) -> Result<ServerHandle, ListenerError> {
    let address = config.bind_address();

    // Resolve TLS before touching the port so bad material never leaves a bound socket.
    let rustls = match credential {
        Some(credential) => Some(credential.into_rustls_config().await.map_err(ListenerError::Tls)?),
        None => None,
    };

    let listener = std::net::TcpListener::bind(address.as_str())
        .and_then(|l| l.set_nonblocking(true).map(|_| l))
        .map_err(|source| ListenerError::Bind { address: address.clone(), source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ListenerError::Bind { address: address.clone(), source })?;

    let handle = Handle::new();
    let secure = rustls.is_some();
    let app = router.into_make_service_with_connect_info::<SocketAddr>();

    let task = match rustls {
        Some(rustls) => {
            let server = axum_server::tls_rustls::from_tcp_rustls(listener, rustls).handle(handle.clone());
            tokio::spawn(async move {
                let result = server.serve(app).await;
                report_exit(local_addr, &result);
                result
            })
        }
        None => {
            let server = axum_server::from_tcp(listener).handle(handle.clone());
            tokio::spawn(async move {
                let result = server.serve(app).await;
                report_exit(local_addr, &result);
                result
            })
        }
    };

    tracing::info!(
        address = %local_addr,
        tls = secure,
        "Listener bound"
    );

    Ok(ServerHandle {
        local_addr,
        secure,
        handle,
        shutdown: Shutdown::new(),
        task: Some(task),
    })
}

fn report_exit(addr: SocketAddr, result: &Result<(), std::io::Error>) {
    match result {
        Ok(()) => tracing::info!(address = %addr, "Listener stopped"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Listener failed"),
    }
}
