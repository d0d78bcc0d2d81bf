//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (net)
//!     → request.rs (request ID)
//!     → middleware/ (CORS headers, cookies)
//!     → security::rate_limit (admission gate)
//!     → provider routes, static files
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::MiddlewareStack;
