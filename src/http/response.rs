//! Rejection responses.
//!
//! A refused request gets the status of its `GuardError` and a JSON body:
//!
//! ```text
//! { "error": { "code": "rate_limited", "message": "...", "retry_after_secs": 12 } }
//! ```
//!
//! Rate-limit rejections also carry `Retry-After`.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::GuardError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<&GuardError> for ErrorBody {
    fn from(err: &GuardError) -> Self {
        Self {
            error: ErrorDetail {
                code: err.code(),
                message: err.to_string(),
                retry_after_secs: err.retry_after_secs(),
            },
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(ErrorBody::from(&self))).into_response();
        if let Some(secs) = self.retry_after_secs() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
