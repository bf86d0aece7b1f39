//! Client identification.
//!
//! The address derived here is only a rate-limit key. Forwarded headers are
//! client-controlled unless a trusted proxy rewrites them, so they are read
//! only when `trust_forwarded_for` is on.

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, HeaderName};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Rate-limit key for a request.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    if trust_forwarded {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return addr.to_string();
        }

        let real_ip = headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = real_ip {
            return addr.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Matches user agents against known scanner signatures.
#[derive(Debug, Clone)]
pub struct SuspiciousClientDetector {
    signatures: Vec<String>,
}

impl SuspiciousClientDetector {
    pub fn new(signatures: &[String]) -> Self {
        Self {
            signatures: signatures
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// The matching signature, if the request's user agent carries one.
    pub fn detect(&self, headers: &HeaderMap) -> Option<&str> {
        let agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())?
            .to_ascii_lowercase();

        self.signatures
            .iter()
            .find(|sig| agent.contains(sig.as_str()))
            .map(String::as_str)
    }
}
