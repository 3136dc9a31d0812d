//! Handler sets mounted by the route table.
//!
//! Each submodule exposes a `router()` relative to its own prefix; the
//! server decides where it is mounted and whether the guard wraps it.

pub mod auth;
pub mod docs;
pub mod jobs;
pub mod root;
