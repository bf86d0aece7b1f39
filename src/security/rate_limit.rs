//! Fixed-window rate limiting keyed by client address.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Counter for one client address within its current window.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    reset_at: Instant,
}

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Instant,
}

impl RateLimitDecision {
    /// Time left until the window resets, zero once it has passed.
    pub fn retry_after(&self, now: Instant) -> Duration {
        self.reset_at.saturating_duration_since(now)
    }
}

/// Per-address fixed-window counters.
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.window_ms))
    }

    /// Count a request from `client` and decide whether it is admitted.
    pub fn check(&self, client: &str) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    /// Same as [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert(RateWindow {
                count: 0,
                reset_at: now,
            });
        let window = entry.value_mut();

        if now >= window.reset_at {
            *window = RateWindow {
                count: 1,
                reset_at: now + self.window,
            };
            return self.decision(true, self.max_requests.saturating_sub(1), window.reset_at);
        }

        if window.count >= self.max_requests {
            return self.decision(false, 0, window.reset_at);
        }

        window.count += 1;
        self.decision(true, self.max_requests - window.count, window.reset_at)
    }

    fn decision(&self, allowed: bool, remaining: u32, reset_at: Instant) -> RateLimitDecision {
        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining,
            reset_at,
        }
    }

    /// Drop every window whose reset time has passed. Returns how many went.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.windows.retain(|_, window| {
            let live = now < window.reset_at;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    /// Number of tracked addresses.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
