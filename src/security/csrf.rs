//! CSRF token issuance and validation keyed by session id.
//!
//! Tokens are reusable until they expire; validation checks possession of a
//! live token and does not consume it. Issuing a new token for a session
//! replaces the previous one.

use std::time::Duration;

use dashmap::DashMap;
use rand::{distributions::Alphanumeric, Rng};
use tokio::time::Instant;

use crate::config::CsrfConfig;

#[derive(Debug, Clone)]
struct CsrfEntry {
    token: String,
    expires_at: Instant,
}

/// Per-session CSRF token store.
pub struct CsrfStore {
    entries: DashMap<String, CsrfEntry>,
    token_length: usize,
    ttl: Duration,
}

impl CsrfStore {
    pub fn new(token_length: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            token_length,
            ttl,
        }
    }

    pub fn from_config(config: &CsrfConfig) -> Self {
        Self::new(config.token_length, Duration::from_secs(config.token_ttl_secs))
    }

    /// Issue a fresh token for `session_id`, replacing any previous one.
    pub fn issue(&self, session_id: &str) -> String {
        self.issue_at(session_id, Instant::now())
    }

    pub fn issue_at(&self, session_id: &str, now: Instant) -> String {
        let token = generate_token(self.token_length);
        self.entries.insert(
            session_id.to_string(),
            CsrfEntry {
                token: token.clone(),
                expires_at: now + self.ttl,
            },
        );

        // Opportunistic cleanup, bounded by the number of live sessions.
        self.sweep(now);
        token
    }

    /// Check that `candidate` is the live token for `session_id`.
    pub fn validate(&self, session_id: &str, candidate: &str) -> bool {
        self.validate_at(session_id, candidate, Instant::now())
    }

    pub fn validate_at(&self, session_id: &str, candidate: &str, now: Instant) -> bool {
        let expired = match self.entries.get(session_id) {
            None => return false,
            Some(entry) if now < entry.expires_at => {
                return constant_time_eq(&entry.token, candidate);
            }
            Some(_) => true,
        };

        if expired {
            // Re-check under the write lock so a concurrent reissue survives.
            self.entries
                .remove_if(session_id, |_, entry| now >= entry.expires_at);
        }
        false
    }

    /// Drop every expired entry. Returns how many went.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = now < entry.expires_at;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Random token from the alphanumeric alphabet using the thread-local CSPRNG.
pub fn generate_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Comparison whose running time does not depend on where the inputs differ.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.bytes().zip(b.bytes()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}
