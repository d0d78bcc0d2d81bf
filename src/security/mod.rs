//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_addr.rs (socket address, trusted forwarding headers → client key)
//!     → rate_limit.rs (per-key admission, 429 on rejection)
//!     → Pass to session and provider routes
//! ```
//!
//! # Design Decisions
//! - Fail closed: a rejected request never reaches a handler
//! - Client keys are opaque strings; collisions share a bucket

pub mod client_addr;
pub mod rate_limit;

pub use client_addr::AddressResolver;
pub use rate_limit::{Decision, RateLimiter, Rejection};
