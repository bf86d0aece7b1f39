//! Origin, method and session admission.
//!
//! Session checks only look for the session cookie; verifying it is the
//! identity provider's job.

use std::collections::HashSet;

use axum::http::{header, HeaderMap, Method};

use crate::config::{CorsConfig, SessionConfig};
use crate::error::GuardError;

/// Origin allow-list plus accepted methods.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: HashSet<String>,
    allowed_methods: HashSet<Method>,
}

impl OriginPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            allowed_origins: config
                .allowed_origins
                .iter()
                .cloned()
                .collect(),
            allowed_methods: config
                .allowed_methods
                .iter()
                .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
                .collect(),
        }
    }

    /// Reject a present-but-unlisted origin, then an unlisted method.
    /// A request without an Origin header passes the origin step.
    pub fn check(&self, origin: Option<&str>, method: &Method) -> Result<(), GuardError> {
        if let Some(origin) = origin {
            if !self.is_allowed_origin(origin) {
                return Err(GuardError::Forbidden {
                    origin: origin.to_string(),
                });
            }
        }

        if !self.allowed_methods.contains(method) {
            return Err(GuardError::MethodNotAllowed {
                method: method.to_string(),
            });
        }

        Ok(())
    }

    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.allowed_origins.contains(origin)
    }
}

/// Which paths need a session, and how to find it.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    cookie_name: String,
    protected_paths: Vec<String>,
    public_paths: Vec<String>,
}

impl SessionPolicy {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            protected_paths: config.protected_paths.clone(),
            public_paths: config.public_paths.clone(),
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_paths.iter().any(|p| matches_prefix(path, p))
            && !self.public_paths.iter().any(|p| matches_prefix(path, p))
    }

    /// Session id carried by the request, if any.
    pub fn session_id<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        find_cookie(headers, &self.cookie_name)
    }

    /// Require a session on protected paths.
    pub fn require_session<'a>(
        &self,
        path: &str,
        headers: &'a HeaderMap,
    ) -> Result<Option<&'a str>, GuardError> {
        let session = self.session_id(headers);
        if self.is_protected(path) && session.is_none() {
            return Err(GuardError::Unauthorized);
        }
        Ok(session)
    }
}

/// Segment-aware prefix match: `/api/auth` covers `/api/auth` and
/// `/api/auth/callback` but not `/api/authors`. A prefix ending in `/`
/// matches anything below it.
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Value of cookie `name` across all Cookie headers. Empty values count as absent.
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// Methods that change server state and therefore need a CSRF token.
pub fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
