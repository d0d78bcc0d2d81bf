//! Client address resolution for rate-limit keys.
//!
//! # Responsibilities
//! - Derive the client key from the socket address
//! - Let forwarding-proxy headers override it when proxies are trusted
//!
//! # Design Decisions
//! - Lookups run in a fixed order, last match wins:
//!   socket < `X-Forwarded-For` < `X-real-IP` < `x-forwarded-for` < `x-real-ip`
//! - Header sets that compare names case-sensitively keep every step of that
//!   order; `http::HeaderMap` folds case, so there the lowercase names win
//! - The result is an opaque key, never parsed as an IP

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Header names consulted after the socket address, lowest precedence first.
pub const FORWARDED_HEADER_PRECEDENCE: [&str; 4] = [
    "X-Forwarded-For",
    "X-real-IP",
    "x-forwarded-for",
    "x-real-ip",
];

/// Key used when neither a socket address nor a trusted header is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Read-only access to request headers by exact name.
pub trait HeaderLookup {
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }
}

impl HeaderLookup for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl HeaderLookup for [(&str, &str)] {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}

/// Resolves the client key for a request.
#[derive(Debug, Clone, Copy)]
pub struct AddressResolver {
    trust_forwarded_headers: bool,
}

impl AddressResolver {
    pub fn new(trust_forwarded_headers: bool) -> Self {
        Self { trust_forwarded_headers }
    }

    /// Derive the client key from the connection address and headers.
    pub fn resolve<H>(&self, connection: Option<SocketAddr>, headers: &H) -> String
    where
        H: HeaderLookup + ?Sized,
    {
        let mut client = connection
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        if !self.trust_forwarded_headers {
            return client;
        }

        for name in FORWARDED_HEADER_PRECEDENCE {
            if let Some(value) = headers.header(name) {
                client = value.to_string();
            }
        }
        client
    }
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::new(true)
    }
}
