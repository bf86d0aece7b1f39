//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (origin allow-list, allowed methods)
//!     → rate_limit.rs (fixed window per client address)
//!     → limits.rs (declared body size)
//!     → access_control.rs (session presence on protected paths)
//!     → csrf.rs (token check on state-changing requests)
//!     → Pass to handler
//! Outgoing response:
//!     → headers.rs (security, CORS and rate-limit headers)
//! ```
//!
//! `guard.rs` ties the pieces together; `sweeper.rs` bounds memory by
//! dropping expired entries on a fixed interval.
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - State is per process; instances behind a load balancer do not share it

pub mod access_control;
pub mod client;
pub mod csrf;
pub mod guard;
pub mod headers;
pub mod limits;
pub mod rate_limit;
pub mod sweeper;

pub use guard::{RequestGuard, SweepReport};
pub use rate_limit::RateLimitDecision;
pub use sweeper::Sweeper;
