//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { name: String, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { name, value } => {
                write!(f, "Invalid value {:?} for environment variable {}", value, name)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from a TOML file, apply process environment
/// overrides, and validate.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AppConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config)
}

/// Start from defaults when no file is given.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    finish(AppConfig::default())
}

fn finish(mut config: AppConfig) -> Result<AppConfig, ConfigError> {
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay deployment environment variables onto `config`.
///
/// Variable names are the ones container deployments already set
/// (`port`, `tls_crt`, `api_rate_limit_points`, ...). Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = get("port") {
        config.listener.port = parse_env("port", &v)?;
    }
    if let Some(v) = get("api_rate_limit") {
        config.rate_limit.enabled = parse_bool("api_rate_limit", &v)?;
    }
    if let Some(v) = get("api_rate_limit_points") {
        config.rate_limit.points = parse_env("api_rate_limit_points", &v)?;
    }
    if let Some(v) = get("api_rate_limit_duration") {
        config.rate_limit.duration_secs = parse_env("api_rate_limit_duration", &v)?;
    }
    if let Some(v) = get("tls_crt") {
        config.listener.tls.certificate = v;
    }
    if let Some(v) = get("tls_key") {
        config.listener.tls.private_key = v;
    }
    if let Some(v) = get("tls_ca") {
        config.listener.tls.certificate_authority = v;
    }
    if let Some(v) = get("tls_passphrase") {
        config.listener.tls.passphrase = v;
    }
    if let Some(v) = get("cookie_secret") {
        config.session.cookie_secret = v;
    }
    if let Some(v) = get("HOSTNAME") {
        config.server.hostname = Some(v);
    }
    if let Some(v) = get("domain") {
        config.server.domain = v;
    }
    if let Some(v) = get("protocol") {
        config.server.protocol = Some(v);
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("port", "8443"),
                ("api_rate_limit", "false"),
                ("api_rate_limit_points", "50"),
                ("api_rate_limit_duration", "60"),
                ("tls_crt", "Y2VydA=="),
                ("tls_key", "a2V5"),
                ("cookie_secret", "s3cret"),
                ("HOSTNAME", "pod-1"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 8443);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.rate_limit.points, 50);
        assert_eq!(config.rate_limit.duration_secs, 60);
        assert_eq!(config.listener.tls.certificate, "Y2VydA==");
        assert_eq!(config.listener.tls.private_key, "a2V5");
        assert_eq!(config.session.cookie_secret, "s3cret");
        assert_eq!(config.server.hostname.as_deref(), Some("pod-1"));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, env(&[("port", ""), ("tls_crt", "")])).unwrap();
        assert_eq!(config.listener.port, 3000);
        assert!(config.listener.tls.certificate.is_empty());
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("port", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref name, .. } if name == "port"));

        let err = apply_env_overrides(&mut config, env(&[("api_rate_limit", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("api_rate_limit"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/front-door.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
