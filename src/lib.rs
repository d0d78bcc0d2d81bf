//! Public HTTP/HTTPS entry point: admission control, TLS and listener
//! lifecycle in front of delegated authentication providers.

pub mod collaborators;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::schema::AppConfig;
pub use lifecycle::{ServerBootstrap, Shutdown};
pub use net::ServerHandle;
