//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and that
//! origins, methods and header values are well-formed. All errors are
//! collected rather than stopping at the first.

use std::fmt;

use axum::http::{HeaderName, HeaderValue, Method};
use url::Url;

use crate::config::schema::GuardConfig;

const MIN_TOKEN_LENGTH: usize = 16;
const MAX_TOKEN_LENGTH: usize = 256;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
    }
    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
    }

    let len = config.csrf.token_length;
    if !(MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH).contains(&len) {
        errors.push(ValidationError::new(
            "csrf.token_length",
            format!("{} is outside {}..={}", len, MIN_TOKEN_LENGTH, MAX_TOKEN_LENGTH),
        ));
    }
    if config.csrf.token_ttl_secs == 0 {
        errors.push(ValidationError::new("csrf.token_ttl_secs", "must be greater than 0"));
    }
    if HeaderName::from_bytes(config.csrf.header_name.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "csrf.header_name",
            format!("'{}' is not a valid header name", config.csrf.header_name),
        ));
    }

    for origin in &config.cors.allowed_origins {
        if let Err(message) = check_origin_format(origin) {
            errors.push(ValidationError::new("cors.allowed_origins", message));
        }
    }
    // Wildcards cannot be combined with credentialed CORS.
    for method in &config.cors.allowed_methods {
        if method == "*" || Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_methods",
                format!("'{}' is not an HTTP method", method),
            ));
        }
    }
    for name in &config.cors.allowed_headers {
        if name == "*" || HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_headers",
                format!("'{}' is not a valid header name", name),
            ));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }
    let header_values = [
        ("security.content_type_options", &config.security.content_type_options),
        ("security.frame_options", &config.security.frame_options),
        ("security.referrer_policy", &config.security.referrer_policy),
        ("security.permissions_policy", &config.security.permissions_policy),
    ];
    for (field, value) in header_values {
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(field, "is not a valid header value"));
        }
    }

    if config.sweeper.interval_secs == 0 {
        errors.push(ValidationError::new("sweeper.interval_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An allowed origin is a bare `http`/`https` origin with no path.
fn check_origin_format(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| format!("'{}': {}", origin, e))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("'{}': scheme must be http or https", origin));
    }
    if url.host_str().is_none() {
        return Err(format!("'{}': missing host", origin));
    }
    if url.path() != "/" || origin.ends_with('/') {
        return Err(format!("'{}': origin must not include a path", origin));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GuardConfig::default();
        config.rate_limit.window_ms = 0;
        config.rate_limit.max_requests = 0;
        config.csrf.token_length = 4;
        config.cors.allowed_methods.push("NOT A METHOD".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "rate_limit.window_ms",
                "rate_limit.max_requests",
                "csrf.token_length",
                "cors.allowed_methods",
            ]
        );
    }

    #[test]
    fn test_cors_wildcards_rejected() {
        let mut config = GuardConfig::default();
        config.cors.allowed_methods.push("*".into());
        config.cors.allowed_headers = vec!["*".into(), "x-csrf-token".into()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["cors.allowed_methods", "cors.allowed_headers"]);
    }

    #[test]
    fn test_origin_format() {
        assert!(check_origin_format("https://learn.example.com").is_ok());
        assert!(check_origin_format("http://localhost:3000").is_ok());
        assert!(check_origin_format("https://learn.example.com/").is_err());
        assert!(check_origin_format("https://learn.example.com/app").is_err());
        assert!(check_origin_format("ftp://files.example.com").is_err());
        assert!(check_origin_format("learn.example.com").is_err());
    }
}
