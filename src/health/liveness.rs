//! `GET /livenessprobe`.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

pub const LIVENESS_PATH: &str = "/livenessprobe";

#[derive(Debug, Clone, Serialize)]
pub struct LivenessBody {
    pub success: &'static str,
    pub hostname: Arc<str>,
}

/// Hostname reported by the probe, resolved once at bootstrap.
#[derive(Debug, Clone)]
pub struct LivenessState {
    pub hostname: Arc<str>,
}

impl LivenessState {
    pub fn new(configured: Option<&str>) -> Self {
        Self {
            hostname: resolve_hostname(configured).into(),
        }
    }
}

pub async fn liveness_handler(State(state): State<LivenessState>) -> Json<LivenessBody> {
    Json(LivenessBody {
        success: "true",
        hostname: state.hostname,
    })
}

/// Configured name, then `HOSTNAME`, then the OS hostname, then "unknown".
pub fn resolve_hostname(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(system_hostname)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn system_hostname() -> Option<String> {
    hostname::get().ok().and_then(|h| h.into_string().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_hostname_wins() {
        assert_eq!(resolve_hostname(Some("gateway-0")), "gateway-0");
    }

    #[test]
    fn test_system_hostname_matches_os() {
        let expected = hostname::get().unwrap().into_string().unwrap();
        assert_eq!(system_hostname().as_deref(), Some(expected.as_str()));
        if std::env::var("HOSTNAME").is_err() && !expected.trim().is_empty() {
            assert_eq!(resolve_hostname(None), expected.trim());
        }
    }

    #[test]
    fn test_hostname_never_empty() {
        assert!(!resolve_hostname(None).is_empty());
        assert!(!resolve_hostname(Some("   ")).is_empty());
    }

    #[tokio::test]
    async fn test_body_shape() {
        let Json(body) = liveness_handler(State(LivenessState::new(Some("node-a")))).await;
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, serde_json::json!({ "success": "true", "hostname": "node-a" }));
    }
}
