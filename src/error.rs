//! Admission rejection taxonomy.
//!
//! Every check in the guard either lets a request through or produces one of
//! these. Conversion into an HTTP response lives in `http::response`.

use std::time::Duration;

use axum::http::StatusCode;

/// Reason a request was refused before reaching its handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// Client exhausted its request window. Retryable after `retry_after`.
    #[error("Too many requests, retry in {}s", ceil_secs(.retry_after))]
    RateLimited { retry_after: Duration },

    /// Origin not on the allow-list.
    #[error("Origin '{origin}' is not allowed")]
    Forbidden { origin: String },

    #[error("Method {method} is not allowed")]
    MethodNotAllowed { method: String },

    /// Missing session on a protected path.
    #[error("Authentication required")]
    Unauthorized,

    /// Body over the size limit. `actual` is the declared length; streamed
    /// bodies have none.
    #[error("Request body{} exceeds the {limit} byte limit", declared_size(.actual))]
    PayloadTooLarge { limit: usize, actual: Option<u64> },

    /// State-changing request without a live CSRF token for its session.
    #[error("Missing or invalid CSRF token")]
    InvalidCsrfToken,
}

impl GuardError {
    /// HTTP status this rejection is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GuardError::Forbidden { .. } => StatusCode::FORBIDDEN,
            GuardError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GuardError::Unauthorized => StatusCode::UNAUTHORIZED,
            GuardError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GuardError::InvalidCsrfToken => StatusCode::FORBIDDEN,
        }
    }

    /// Stable machine-readable classification.
    pub fn code(&self) -> &'static str {
        match self {
            GuardError::RateLimited { .. } => "rate_limited",
            GuardError::Forbidden { .. } => "forbidden",
            GuardError::MethodNotAllowed { .. } => "method_not_allowed",
            GuardError::Unauthorized => "unauthorized",
            GuardError::PayloadTooLarge { .. } => "payload_too_large",
            GuardError::InvalidCsrfToken => "invalid_csrf_token",
        }
    }

    /// Seconds until a retry may succeed, for rate-limit rejections only.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GuardError::RateLimited { retry_after } => Some(ceil_secs(retry_after)),
            _ => None,
        }
    }
}

/// Whole seconds, rounded up and at least one, so clients never retry
/// inside a closed window.
fn ceil_secs(duration: &Duration) -> u64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.max(1)
}

fn declared_size(actual: &Option<u64>) -> String {
    actual.map(|n| format!(" of {n} bytes")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let limited = GuardError::RateLimited { retry_after: Duration::from_secs(3) };
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.code(), "rate_limited");

        let forbidden = GuardError::Forbidden { origin: "https://evil.test".into() };
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(GuardError::InvalidCsrfToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(GuardError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GuardError::PayloadTooLarge { limit: 10, actual: Some(11) }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_payload_message_with_and_without_length() {
        let declared = GuardError::PayloadTooLarge { limit: 10, actual: Some(11) };
        assert_eq!(declared.to_string(), "Request body of 11 bytes exceeds the 10 byte limit");

        let streamed = GuardError::PayloadTooLarge { limit: 10, actual: None };
        assert_eq!(streamed.to_string(), "Request body exceeds the 10 byte limit");
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let err = GuardError::RateLimited { retry_after: Duration::from_millis(1500) };
        assert_eq!(err.retry_after_secs(), Some(2));

        let err = GuardError::RateLimited { retry_after: Duration::from_millis(0) };
        assert_eq!(err.retry_after_secs(), Some(1));

        assert_eq!(GuardError::Unauthorized.retry_after_secs(), None);
    }
}
