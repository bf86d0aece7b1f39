//! Security and CORS response headers.
//!
//! Header values are parsed once from configuration; applying them is a
//! plain overwrite, so running it twice changes nothing.

use std::time::Duration;

use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{CorsConfig, SecurityConfig};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Fixed response headers added to every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    /// Build from configuration. Values that are not valid header values are
    /// skipped with an error log; validation normally rejects them earlier.
    pub fn from_config(config: &SecurityConfig) -> Self {
        let pairs = [
            (header::X_CONTENT_TYPE_OPTIONS, &config.content_type_options),
            (header::X_FRAME_OPTIONS, &config.frame_options),
            (header::REFERRER_POLICY, &config.referrer_policy),
            (HeaderName::from_static("permissions-policy"), &config.permissions_policy),
        ];

        let headers = pairs
            .into_iter()
            .filter_map(|(name, value)| match HeaderValue::from_str(value) {
                Ok(v) => Some((name, v)),
                Err(_) => {
                    tracing::error!(header = %name, "Invalid security header value, skipping");
                    None
                }
            })
            .collect();

        Self { headers }
    }

    /// Set every security header on `headers`, replacing existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

/// CORS layer for the guarded router. Origins outside the allow-list never
/// reach it; the guard rejects them first.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect();
    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age_secs))
}
