//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, pretty or JSON)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! Every request carries an `x-request-id` that appears in trace spans and
//! is echoed on the response.

pub mod logging;
pub mod metrics;
