//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client fixed window, client_ip.rs for the key)
//!     → headers.rs (defensive response headers)
//!     → cors.rs (cross-origin policy, preflight)
//!     → sanitize.rs (escape markup in path, query, JSON body)
//!     → Pass to routing
//! ```
//!
//! Only the rate limiter can reject. The other stages are pure transforms.

pub mod client_ip;
pub mod cors;
pub mod headers;
pub mod rate_limit;
pub mod sanitize;

pub use headers::SecurityHeaders;
pub use rate_limit::{RateDecision, RateLimiter};
