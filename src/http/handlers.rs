use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use crate::error::GuardError;
use crate::http::middleware::SessionId;
use crate::security::RequestGuard;

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub rate_windows: usize,
    pub csrf_entries: usize,
}

#[derive(Serialize)]
pub struct CsrfTokenBody {
    pub token: String,
    pub expires_in_secs: u64,
}

pub async fn health(State(guard): State<Arc<RequestGuard>>) -> Json<HealthStatus> {
    let (rate_windows, csrf_entries) = guard.tracked();
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        rate_windows,
        csrf_entries,
    })
}

/// Issue a CSRF token for the caller's session. The token is returned both
/// in the configured header and in the body.
pub async fn issue_csrf_token(
    State(guard): State<Arc<RequestGuard>>,
    session: Option<Extension<SessionId>>,
) -> impl IntoResponse {
    let Some(Extension(SessionId(session))) = session else {
        return GuardError::Unauthorized.into_response();
    };

    let token = guard.issue_csrf_token(&session);
    let csrf = &guard.config().csrf;

    let header = HeaderName::from_bytes(csrf.header_name.as_bytes());
    let value = HeaderValue::from_str(&token);
    let body = Json(CsrfTokenBody {
        token,
        expires_in_secs: csrf.token_ttl_secs,
    });

    match (header, value) {
        (Ok(name), Ok(value)) => ([(name, value)], body).into_response(),
        _ => {
            tracing::error!(header = %csrf.header_name, "Cannot build CSRF token header");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue CSRF token").into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": { "code": "not_found", "message": "No matching route" }
        })),
    )
}
