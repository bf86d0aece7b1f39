//! Admission middleware.
//!
//! Runs the guard's checks in a fixed order before the handler and decorates
//! every response, admitted or rejected, with security headers. CORS headers
//! come from the `CorsLayer` below this middleware, so only admitted
//! requests see them.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;

use crate::error::GuardError;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::security::client::client_address;
use crate::security::headers::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};
use crate::security::{RateLimitDecision, RequestGuard};

/// Session id of an admitted request, for handlers that need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// A failed admission step, with the rate-limit decision if the request had
/// already been counted.
struct Rejection {
    error: GuardError,
    decision: Option<RateLimitDecision>,
}

impl From<GuardError> for Rejection {
    fn from(error: GuardError) -> Self {
        Self {
            error,
            decision: None,
        }
    }
}

pub async fn guard_middleware(
    State(guard): State<Arc<RequestGuard>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_address(
        request.headers(),
        peer,
        guard.config().rate_limit.trust_forwarded_for,
    );
    let path = request.uri().path().to_string();
    let method = request.method().clone();
    let request_id = request_id(&request);

    if let Some(signature) = guard.detect_suspicious(request.headers()) {
        tracing::warn!(
            request_id = %request_id,
            client = %client,
            path = %path,
            signature,
            "Suspicious client signature"
        );
        metrics::record_suspicious_client();
    }

    let preflight = method == Method::OPTIONS && request.headers().contains_key(header::ORIGIN);
    let (decision, session) = match admit(&guard, &request, &client, &path, preflight) {
        Ok(admitted) => admitted,
        Err(Rejection { error, decision }) => {
            tracing::warn!(
                request_id = %request_id,
                client = %client,
                method = %method,
                path = %path,
                code = error.code(),
                "Request rejected"
            );
            metrics::record_rejected(error.code());
            let mut response = error.into_response();
            decorate(&guard, response.headers_mut(), decision.as_ref());
            return response;
        }
    };

    metrics::record_admitted();

    if let Some(session) = session {
        request.extensions_mut().insert(SessionId(session));
    }

    let mut response = next.run(request).await;

    // Bodies without Content-Length are cut off while streaming, below us.
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json(response.headers()) {
        let error = GuardError::PayloadTooLarge {
            limit: guard.config().security.max_body_size,
            actual: None,
        };
        tracing::warn!(
            request_id = %request_id,
            client = %client,
            method = %method,
            path = %path,
            code = error.code(),
            "Request body exceeded the limit while streaming"
        );
        metrics::record_rejected(error.code());
        response = error.into_response();
    }

    decorate(&guard, response.headers_mut(), decision.as_ref());
    response
}

/// The admission pipeline. Returns the rate-limit decision (if counted) and
/// the session id (if present). Preflights carry no cookies, so they stop
/// after the body check and are answered by the CORS layer.
fn admit(
    guard: &RequestGuard,
    request: &Request<Body>,
    client: &str,
    path: &str,
    preflight: bool,
) -> Result<(Option<RateLimitDecision>, Option<String>), Rejection> {
    let headers = request.headers();
    let method = request.method();

    let origin = match headers.get(header::ORIGIN) {
        Some(value) => Some(value.to_str().map_err(|_| GuardError::Forbidden {
            origin: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        })?),
        None => None,
    };
    guard.check_origin(origin, method)?;

    let decision = guard.admit_rate(client, path)?;
    let counted = move |error: GuardError| Rejection { error, decision };

    guard.check_body_size(headers).map_err(counted)?;
    if preflight {
        return Ok((decision, None));
    }

    let session = guard
        .sessions()
        .require_session(path, headers)
        .map_err(counted)?;
    guard
        .admit_csrf(method, path, session, headers)
        .map_err(counted)?;

    Ok((decision, session.map(str::to_string)))
}

/// Security headers always; rate-limit headers when the request was counted.
fn decorate(guard: &RequestGuard, headers: &mut HeaderMap, decision: Option<&RateLimitDecision>) {
    guard.apply_security_headers(headers);

    if let Some(decision) = decision {
        let retry_after = decision.retry_after(Instant::now());
        let reset_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset_secs));
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"))
}
