//! Health reporting subsystem.
//!
//! # Design Decisions
//! - The liveness probe sits outside the rate-limit gate so orchestrators
//!   always get an answer
//! - Hostname is resolved once, not per probe

pub mod liveness;

pub use liveness::{liveness_handler, LivenessState, LIVENESS_PATH};
