//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing subscriber, env filter)
//!     → metrics.rs (counters for rejections and bootstrap outcomes)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, never formatted strings alone
//! - Bootstrap runs inside one span so its events share context
//! - Metrics are cheap and off until an exporter is installed

pub mod logging;
pub mod metrics;
