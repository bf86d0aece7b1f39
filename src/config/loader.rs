//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::GuardConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "GUARD_";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: String, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the startup configuration: defaults, then the optional file,
/// then `GUARD_*` environment variables. Validated once at the end.
pub fn load_startup_config(path: Option<&Path>) -> Result<GuardConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GuardConfig::default(),
    };

    apply_env_overrides(&mut config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `GUARD_*` overrides from an iterator of environment pairs.
/// Unknown `GUARD_*` keys are ignored with a warning.
pub fn apply_env_overrides<I>(config: &mut GuardConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        match name {
            "BIND_ADDRESS" => config.listener.bind_address = value,
            "ALLOWED_ORIGINS" => config.cors.allowed_origins = split_list(&value),
            "ALLOWED_METHODS" => {
                config.cors.allowed_methods = split_list(&value)
                    .into_iter()
                    .map(|m| m.to_ascii_uppercase())
                    .collect()
            }
            "RATE_LIMIT_ENABLED" => config.rate_limit.enabled = parse_var(&key, &value)?,
            "RATE_LIMIT_WINDOW_MS" => config.rate_limit.window_ms = parse_var(&key, &value)?,
            "RATE_LIMIT_MAX_REQUESTS" => {
                config.rate_limit.max_requests = parse_var(&key, &value)?
            }
            "TRUST_FORWARDED_FOR" => {
                config.rate_limit.trust_forwarded_for = parse_var(&key, &value)?
            }
            "CSRF_ENABLED" => config.csrf.enabled = parse_var(&key, &value)?,
            "CSRF_TOKEN_LENGTH" => config.csrf.token_length = parse_var(&key, &value)?,
            "CSRF_TOKEN_TTL_SECS" => config.csrf.token_ttl_secs = parse_var(&key, &value)?,
            "SESSION_COOKIE" => config.session.cookie_name = value,
            "MAX_BODY_SIZE" => config.security.max_body_size = parse_var(&key, &value)?,
            "FRAME_OPTIONS" => config.security.frame_options = value,
            "SWEEP_INTERVAL_SECS" => config.sweeper.interval_secs = parse_var(&key, &value)?,
            "LOG_LEVEL" => config.observability.log_level = value,
            "METRICS_ENABLED" => config.observability.metrics_enabled = parse_var(&key, &value)?,
            "METRICS_ADDRESS" => config.observability.metrics_address = value,
            _ => tracing::warn!(var = %key, "Ignoring unknown configuration variable"),
        }
    }
    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GuardConfig::default();
        apply_env_overrides(
            &mut config,
            vars(&[
                ("GUARD_ALLOWED_ORIGINS", "https://a.example.com, https://b.example.com,"),
                ("GUARD_ALLOWED_METHODS", "get,post"),
                ("GUARD_RATE_LIMIT_MAX_REQUESTS", "7"),
                ("GUARD_CSRF_TOKEN_TTL_SECS", "120"),
                ("GUARD_TRUST_FORWARDED_FOR", "true"),
                ("PATH", "/usr/bin"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(config.cors.allowed_methods, vec!["GET", "POST"]);
        assert_eq!(config.rate_limit.max_requests, 7);
        assert_eq!(config.csrf.token_ttl_secs, 120);
        assert!(config.rate_limit.trust_forwarded_for);
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = GuardConfig::default();
        let err = apply_env_overrides(&mut config, vars(&[("GUARD_MAX_BODY_SIZE", "lots")]))
            .unwrap_err();
        match err {
            ConfigError::Env { var, value } => {
                assert_eq!(var, "GUARD_MAX_BODY_SIZE");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_startup_config_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("guard-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[rate_limit]\nmax_requests = 0\n").unwrap();

        let err = load_startup_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("rate_limit.max_requests"));

        fs::remove_file(&path).unwrap_or_default();
    }
}
