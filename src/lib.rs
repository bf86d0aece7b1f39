//! Per-request admission control for the learning platform's HTTP surface.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GuardConfig;
pub use error::GuardError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::RequestGuard;
