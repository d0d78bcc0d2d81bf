//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (bootstrap.rs):
//!     Middleware → Providers → TLS → Data store → Bind → Serving
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//! ```
//!
//! # Design Decisions
//! - Listeners start last (traffic only when ready)
//! - Shutdown has a grace period, then connections are closed

pub mod bootstrap;
pub mod shutdown;

pub use bootstrap::{BootstrapError, BootstrapStage, ServerBootstrap};
pub use shutdown::{shutdown_signal, Shutdown};
