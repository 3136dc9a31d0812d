//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RoutesConfig (api prefix, docs path)
//!     → router.rs (build the four entries, reject overlaps)
//!     → Freeze as immutable RouteTable
//!     → http::server composes one handler set per entry,
//!       wrapping guarded entries with the authentication guard
//!
//! Per request:
//!     path → matcher.rs (exact root / segment-aware prefix)
//!          → RouteEntry or NoMatch (→ not-found envelope)
//! ```
//!
//! Prefixes are disjoint, so at most one entry matches any path.

pub mod matcher;
pub mod router;

pub use router::{RouteEntry, RouteKind, RouteTable, RouteTableError};
