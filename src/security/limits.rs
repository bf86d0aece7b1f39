//! Request body size admission.
//!
//! A declared `Content-Length` above the limit is rejected up front with
//! 413. Bodies without a length are capped while streaming by
//! `RequestBodyLimitLayer` in the server stack.

use axum::http::{header, HeaderMap};

use crate::error::GuardError;

/// Reject requests that declare a body larger than `limit` bytes.
pub fn check_content_length(headers: &HeaderMap, limit: usize) -> Result<(), GuardError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(actual) if actual > limit as u64 => Err(GuardError::PayloadTooLarge {
            limit,
            actual: Some(actual),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_content_length_limit() {
        let mut headers = HeaderMap::new();
        assert!(check_content_length(&headers, 10).is_ok());

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        assert!(check_content_length(&headers, 10).is_ok());

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("11"));
        assert_eq!(
            check_content_length(&headers, 10),
            Err(GuardError::PayloadTooLarge {
                limit: 10,
                actual: Some(11)
            })
        );
    }
}
