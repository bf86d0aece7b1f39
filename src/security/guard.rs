//! Request admission facade.
//!
//! `RequestGuard` owns the rate-limit and CSRF stores together with the
//! stateless policies built from configuration. One instance is shared
//! through `Arc` for the lifetime of the process.

use std::time::Duration;

use axum::http::{HeaderMap, Method};
use tokio::time::Instant;

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::observability::metrics;
use crate::security::access_control::{is_state_changing, matches_prefix, OriginPolicy, SessionPolicy};
use crate::security::client::SuspiciousClientDetector;
use crate::security::csrf::CsrfStore;
use crate::security::headers::SecurityHeaders;
use crate::security::limits;
use crate::security::rate_limit::{RateLimitDecision, RateLimiter};

/// Entries removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub rate_windows: usize,
    pub csrf_entries: usize,
}

pub struct RequestGuard {
    rate_limiter: RateLimiter,
    csrf: CsrfStore,
    origins: OriginPolicy,
    sessions: SessionPolicy,
    security_headers: SecurityHeaders,
    suspicious: SuspiciousClientDetector,
    config: GuardConfig,
}

impl RequestGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            rate_limiter: RateLimiter::from_config(&config.rate_limit),
            csrf: CsrfStore::from_config(&config.csrf),
            origins: OriginPolicy::from_config(&config.cors),
            sessions: SessionPolicy::from_config(&config.session),
            security_headers: SecurityHeaders::from_config(&config.security),
            suspicious: SuspiciousClientDetector::new(&config.security.suspicious_user_agents),
            config,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Count a request against `client`'s window.
    pub fn check_rate_limit(&self, client: &str) -> RateLimitDecision {
        self.rate_limiter.check(client)
    }

    /// Rate-limit step of the admission pipeline. Exempt paths and a
    /// disabled limiter yield `Ok(None)`.
    pub fn admit_rate(&self, client: &str, path: &str) -> Result<Option<RateLimitDecision>, GuardError> {
        if !self.config.rate_limit.enabled || self.is_rate_exempt(path) {
            return Ok(None);
        }

        let decision = self.check_rate_limit(client);
        if decision.allowed {
            Ok(Some(decision))
        } else {
            Err(GuardError::RateLimited {
                retry_after: decision.retry_after(Instant::now()),
            })
        }
    }

    pub fn is_rate_exempt(&self, path: &str) -> bool {
        self.config
            .rate_limit
            .exempt_paths
            .iter()
            .any(|p| matches_prefix(path, p))
    }

    pub fn issue_csrf_token(&self, session_id: &str) -> String {
        let token = self.csrf.issue(session_id);
        metrics::record_csrf_issued();
        token
    }

    pub fn validate_csrf_token(&self, session_id: &str, candidate: &str) -> bool {
        self.csrf.validate(session_id, candidate)
    }

    /// CSRF step: state-changing requests on protected paths must echo the
    /// session's live token in the configured header.
    pub fn admit_csrf(
        &self,
        method: &Method,
        path: &str,
        session_id: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<(), GuardError> {
        if !self.config.csrf.enabled
            || !is_state_changing(method)
            || !self.sessions.is_protected(path)
        {
            return Ok(());
        }

        let candidate = headers
            .get(self.config.csrf.header_name.as_str())
            .and_then(|v| v.to_str().ok());

        match (session_id, candidate) {
            (Some(session), Some(token)) if self.validate_csrf_token(session, token) => Ok(()),
            _ => Err(GuardError::InvalidCsrfToken),
        }
    }

    pub fn check_origin(&self, origin: Option<&str>, method: &Method) -> Result<(), GuardError> {
        self.origins.check(origin, method)
    }

    pub fn check_body_size(&self, headers: &HeaderMap) -> Result<(), GuardError> {
        limits::check_content_length(headers, self.config.security.max_body_size)
    }

    pub fn sessions(&self) -> &SessionPolicy {
        &self.sessions
    }

    pub fn apply_security_headers(&self, headers: &mut HeaderMap) {
        self.security_headers.apply(headers);
    }

    pub fn detect_suspicious(&self, headers: &HeaderMap) -> Option<&str> {
        self.suspicious.detect(headers)
    }

    /// Remove expired rate windows and CSRF entries.
    pub fn sweep_expired(&self) -> SweepReport {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&self, now: Instant) -> SweepReport {
        let report = SweepReport {
            rate_windows: self.rate_limiter.sweep(now),
            csrf_entries: self.csrf.sweep(now),
        };

        metrics::record_sweep("rate_windows", report.rate_windows);
        metrics::record_sweep("csrf_entries", report.csrf_entries);
        metrics::record_store_sizes(self.rate_limiter.len(), self.csrf.len());
        report
    }

    /// Live entry counts: (rate windows, CSRF entries).
    pub fn tracked(&self) -> (usize, usize) {
        (self.rate_limiter.len(), self.csrf.len())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.config.sweeper.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn guard() -> RequestGuard {
        let mut config = GuardConfig::default();
        config.rate_limit.max_requests = 2;
        config.rate_limit.window_ms = 1000;
        RequestGuard::new(config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_admit_rate_window_cycle() {
        let guard = guard();

        assert_eq!(guard.admit_rate("A", "/courses").unwrap().unwrap().remaining, 1);
        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(guard.admit_rate("A", "/courses").unwrap().unwrap().remaining, 0);
        tokio::time::advance(Duration::from_millis(10)).await;

        let err = guard.admit_rate("A", "/courses").unwrap_err();
        assert_eq!(
            err,
            GuardError::RateLimited {
                retry_after: Duration::from_millis(980)
            }
        );

        tokio::time::advance(Duration::from_millis(1030)).await;
        assert_eq!(guard.admit_rate("A", "/courses").unwrap().unwrap().remaining, 1);
    }

    #[test]
    fn test_exempt_paths_skip_counting() {
        let guard = guard();
        for _ in 0..10 {
            assert_eq!(guard.admit_rate("A", "/health").unwrap(), None);
        }
        assert_eq!(guard.tracked().0, 0);
    }

    #[test]
    fn test_exempt_prefix_does_not_cover_lookalikes() {
        let guard = guard();
        assert!(guard.is_rate_exempt("/health"));
        assert!(!guard.is_rate_exempt("/healthcare/records"));

        assert!(guard.admit_rate("A", "/healthcare/records").unwrap().is_some());
        assert!(guard.admit_rate("A", "/healthcare/records").unwrap().is_some());
        assert!(matches!(
            guard.admit_rate("A", "/healthcare/records"),
            Err(GuardError::RateLimited { .. })
        ));
    }

    #[test]
    fn test_disabled_rate_limit() {
        let mut config = GuardConfig::default();
        config.rate_limit.enabled = false;
        let guard = RequestGuard::new(config);
        assert_eq!(guard.admit_rate("A", "/courses").unwrap(), None);
    }

    #[test]
    fn test_admit_csrf() {
        let guard = guard();
        let token = guard.issue_csrf_token("s1");

        let mut headers = HeaderMap::new();
        assert_eq!(
            guard.admit_csrf(&Method::POST, "/api/courses", Some("s1"), &headers),
            Err(GuardError::InvalidCsrfToken)
        );

        headers.insert("x-csrf-token", HeaderValue::from_str(&token).unwrap());
        assert!(guard.admit_csrf(&Method::POST, "/api/courses", Some("s1"), &headers).is_ok());
        assert_eq!(
            guard.admit_csrf(&Method::POST, "/api/courses", Some("s2"), &headers),
            Err(GuardError::InvalidCsrfToken)
        );

        // Safe methods and public paths are not checked.
        assert!(guard.admit_csrf(&Method::GET, "/api/courses", None, &HeaderMap::new()).is_ok());
        assert!(guard.admit_csrf(&Method::POST, "/api/webhooks/stripe", None, &HeaderMap::new()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_expired_clears_both_stores() {
        let mut config = GuardConfig::default();
        config.rate_limit.window_ms = 1000;
        config.csrf.token_ttl_secs = 5;
        let guard = RequestGuard::new(config);

        guard.check_rate_limit("A");
        guard.check_rate_limit("B");
        guard.issue_csrf_token("s1");
        assert_eq!(guard.tracked(), (2, 1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            guard.sweep_expired(),
            SweepReport {
                rate_windows: 2,
                csrf_entries: 0
            }
        );

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(guard.sweep_expired().csrf_entries, 1);
        assert_eq!(guard.tracked(), (0, 0));
    }
}
