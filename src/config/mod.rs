//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → .env + process environment (PORT, STORAGE_URI, JWT_SECRET, ...)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to the lifecycle once at startup
//! ```
//!
//! Config is read once. There is no hot reload.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, AuthConfig, ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig,
    RoutesConfig, SecurityConfig, StorageConfig,
};
