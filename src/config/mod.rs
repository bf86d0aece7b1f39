//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file, then GUARD_* environment)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! Configuration is fixed at process start; there is no hot reload.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_startup_config, ConfigError};
pub use schema::*;
pub use validation::{validate_config, ValidationError};
