//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (pipeline: request id, metrics, envelope guard,
//!                  rate limit, security headers, CORS, sanitize)
//!     → extract.rs (JSON body, path parameters)
//!     → handlers (root, docs, auth, jobs)
//!     → error.rs (failures rendered as `{message, statusCode}`)
//!     → Send to client
//! ```

pub mod error;
pub mod extract;
pub mod server;

pub use error::{ApiError, ErrorEnvelope};
pub use server::{AppService, AppState, HttpServer};
