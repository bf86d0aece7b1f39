//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, ambient layers)
//!     → request.rs (assign request ID)
//!     → middleware/guard.rs (admission checks)
//!     → handlers.rs or the application's own routes
//!     → response.rs (rejections as JSON)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, HttpServer, CSRF_TOKEN_PATH};
