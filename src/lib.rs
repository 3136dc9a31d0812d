//! Jobs API library: request pipeline, handler sets and lifecycle.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod storage;

pub use config::AppConfig;
pub use http::{AppService, AppState, HttpServer};
pub use lifecycle::{Lifecycle, LifecycleState, Shutdown, StartupError};
