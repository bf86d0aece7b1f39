//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the request guard service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Fixed-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// CSRF token issuance and validation.
    pub csrf: CsrfConfig,

    /// Origin and method admission.
    pub cors: CorsConfig,

    /// Session presence checks for protected paths.
    pub session: SessionConfig,

    /// Security headers and request limits.
    pub security: SecurityConfig,

    /// Background cleanup of expired entries.
    pub sweeper: SweeperConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Length of one window in milliseconds.
    pub window_ms: u64,

    /// Maximum requests per client address per window.
    pub max_requests: u32,

    /// Path prefixes that skip the rate-limit step.
    pub exempt_paths: Vec<String>,

    /// Derive the client address from X-Forwarded-For / X-Real-IP.
    /// Only enable behind a proxy that overwrites these headers.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            max_requests: 100,
            exempt_paths: vec![
                "/health".to_string(),
                "/_next/static".to_string(),
                "/favicon.ico".to_string(),
            ],
            trust_forwarded_for: false,
        }
    }
}

/// CSRF configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Enforce tokens on state-changing requests to protected paths.
    pub enabled: bool,

    /// Number of alphanumeric characters in a token.
    pub token_length: usize,

    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// Request/response header carrying the token.
    pub header_name: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token_length: 32,
            token_ttl_secs: 3600,
            header_name: "x-csrf-token".to_string(),
        }
    }
}

/// Origin / method admission configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the service (scheme://host[:port]).
    pub allowed_origins: Vec<String>,

    /// Methods the service accepts.
    pub allowed_methods: Vec<String>,

    /// Headers advertised on preflight responses.
    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec![
                "content-type".to_string(),
                "authorization".to_string(),
                "x-csrf-token".to_string(),
            ],
            max_age_secs: 86_400,
        }
    }
}

/// Session presence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie whose presence marks an authenticated session.
    pub cookie_name: String,

    /// Path prefixes requiring a session.
    pub protected_paths: Vec<String>,

    /// Prefixes under a protected path that stay public.
    pub public_paths: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sb-access-token".to_string(),
            protected_paths: vec![
                "/dashboard".to_string(),
                "/admin".to_string(),
                "/teacher".to_string(),
                "/student".to_string(),
                "/api/".to_string(),
            ],
            public_paths: vec![
                "/api/auth".to_string(),
                "/api/webhooks".to_string(),
            ],
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// X-Content-Type-Options value.
    pub content_type_options: String,
    /// X-Frame-Options value.
    pub frame_options: String,
    /// Referrer-Policy value.
    pub referrer_policy: String,
    /// Permissions-Policy value.
    pub permissions_policy: String,
    /// User-agent substrings logged as suspicious (case-insensitive).
    pub suspicious_user_agents: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
            content_type_options: "nosniff".to_string(),
            frame_options: "DENY".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
            permissions_policy: "camera=(), microphone=(), geolocation=()".to_string(),
            suspicious_user_agents: ["sqlmap", "nikto", "nmap", "masscan", "zgrab"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Expired-entry sweeper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweeperConfig {
    /// Interval between sweeps in seconds.
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { interval_secs: 3600 }
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
