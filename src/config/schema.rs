//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (port, bind host, TLS material).
    pub listener: ListenerConfig,

    /// Per-client request rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Cookie session settings handed to the session middleware.
    pub session: SessionConfig,

    /// General server behaviour (hostname, base URL, static files, limits).
    pub server: ServerConfig,

    /// Trust settings for forwarding proxies in front of the gateway.
    pub proxy: ProxyTrustConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Port to listen on (1-65535).
    pub port: u16,

    /// Interface to bind, e.g. "0.0.0.0".
    pub bind_host: String,

    /// TLS material. Empty certificate or key means plaintext.
    pub tls: TlsConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_host: "0.0.0.0".to_string(),
            tls: TlsConfig::default(),
        }
    }
}

impl ListenerConfig {
    /// Address string for the listener to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

/// TLS material for the listener.
///
/// Every field holds either PEM text or the base64 encoding of PEM text.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// Certificate chain.
    pub certificate: String,

    /// Private key.
    pub private_key: String,

    /// Extra CA certificates presented after the leaf.
    pub certificate_authority: String,

    /// Passphrase for an encrypted private key.
    pub passphrase: String,
}

impl TlsConfig {
    /// Both certificate and key are present.
    pub fn is_enabled(&self) -> bool {
        !self.certificate.is_empty() && !self.private_key.is_empty()
    }
}

// Key material stays out of debug logs.
impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("certificate_len", &self.certificate.len())
            .field("private_key_len", &self.private_key.len())
            .field("certificate_authority_len", &self.certificate_authority.len())
            .field("passphrase_set", &!self.passphrase.is_empty())
            .finish()
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable the rate-limit gate. Read once at bootstrap.
    pub enabled: bool,

    /// Requests allowed per client within one window.
    pub points: u32,

    /// Window length in seconds.
    pub duration_secs: u64,

    /// How often expired buckets are reclaimed, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            points: 20,
            duration_secs: 1,
            sweep_interval_secs: 60,
        }
    }
}

/// Cookie session configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Secret used by the session middleware to sign cookies.
    pub cookie_secret: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            cookie_secret: String::new(),
        }
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secret_set", &!self.cookie_secret.is_empty())
            .finish()
    }
}

/// General server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname reported by the liveness probe. Falls back to `HOSTNAME`
    /// and then the OS hostname when unset.
    pub hostname: Option<String>,

    /// Public domain used to derive the base URL.
    pub domain: String,

    /// Public scheme ("http" or "https"). Derived from TLS when unset.
    pub protocol: Option<String>,

    /// Explicit base URL handed to providers; overrides domain/protocol.
    pub base_url: Option<String>,

    /// Directory served for unmatched routes.
    pub static_dir: Option<String>,

    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            domain: "localhost".to_string(),
            protocol: None,
            base_url: None,
            static_dir: None,
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            shutdown_grace_secs: 10,
        }
    }
}

/// Forwarding proxy trust.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyTrustConfig {
    /// Honour X-Forwarded-For / X-Real-IP when deriving client keys.
    pub trust_forwarded_headers: bool,
}

impl Default for ProxyTrustConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_headers: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl AppConfig {
    /// Public scheme, honouring an explicit `server.protocol`.
    pub fn scheme(&self) -> &str {
        match self.server.protocol.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ if self.listener.tls.is_enabled() => "https",
            _ => "http",
        }
    }

    /// Base URL handed to provider configurators.
    ///
    /// Default ports (80 for http, 443 for https) are left out.
    pub fn base_url(&self) -> String {
        if let Some(url) = self.server.base_url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }
        let scheme = self.scheme();
        let port = self.listener.port;
        let default_port = matches!((scheme, port), ("http", 80) | ("https", 443));
        if default_port {
            format!("{}://{}/", scheme, self.server.domain)
        } else {
            format!("{}://{}:{}/", scheme, self.server.domain, port)
        }
    }
}
