//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port, points, durations)
//! - Validate the base URL handed to providers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::AppConfig;

/// Longest accepted rate-limit window: one year.
pub const MAX_RATE_LIMIT_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.port must be between 1 and 65535")]
    InvalidPort,

    #[error("listener.bind_host must not be empty")]
    EmptyBindHost,

    #[error("rate_limit.points must be greater than zero")]
    ZeroPoints,

    #[error("rate_limit.duration_secs must be greater than zero")]
    ZeroDuration,

    #[error("rate_limit.duration_secs must be at most {max}, got {got}")]
    DurationTooLong { got: u64, max: u64 },

    #[error("rate_limit.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("server.base_url is not a valid absolute URL: {0}")]
    InvalidBaseUrl(String),

    #[error("server.protocol must be \"http\" or \"https\", got {0:?}")]
    InvalidProtocol(String),
}

/// Check every semantic rule and collect all failures.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if config.listener.bind_host.trim().is_empty() {
        errors.push(ValidationError::EmptyBindHost);
    }

    if config.rate_limit.enabled {
        if config.rate_limit.points == 0 {
            errors.push(ValidationError::ZeroPoints);
        }
        if config.rate_limit.duration_secs == 0 {
            errors.push(ValidationError::ZeroDuration);
        }
        if config.rate_limit.duration_secs > MAX_RATE_LIMIT_DURATION_SECS {
            errors.push(ValidationError::DurationTooLong {
                got: config.rate_limit.duration_secs,
                max: MAX_RATE_LIMIT_DURATION_SECS,
            });
        }
        if config.rate_limit.sweep_interval_secs == 0 {
            errors.push(ValidationError::ZeroSweepInterval);
        }
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if let Some(protocol) = config.server.protocol.as_deref() {
        if !protocol.is_empty() && protocol != "http" && protocol != "https" {
            errors.push(ValidationError::InvalidProtocol(protocol.to_string()));
        }
    }

    let base_url = config.base_url();
    if let Err(e) = url::Url::parse(&base_url) {
        errors.push(ValidationError::InvalidBaseUrl(format!("{}: {}", base_url, e)));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
