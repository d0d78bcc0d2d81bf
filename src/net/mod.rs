//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! TlsConfig (PEM or base64 strings)
//!     → tls.rs (materialize → TlsCredential → RustlsConfig)
//!     → listener.rs (bind port, serve plaintext or TLS)
//!     → ServerHandle (address, shutdown, serve result)
//! ```
//!
//! # Design Decisions
//! - TLS is optional; empty certificate or key means plaintext
//! - Bind errors are returned to the caller, not only logged

pub mod listener;
pub mod tls;

pub use listener::{create_listener, ListenerError, ServerHandle};
pub use tls::{materialize, TlsCredential, TlsError};
