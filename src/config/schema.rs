//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the jobs API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Storage backend connection.
    pub storage: StorageConfig,

    /// Bearer credential settings.
    pub auth: AuthConfig,

    /// Route prefixes.
    pub routes: RoutesConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Security headers, CORS and body limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Zero lets the OS pick one.
    pub port: u16,
}

impl ListenerConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Storage connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Connection string handed to the storage connector.
    pub uri: String,
}

/// Credential signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify bearer tokens.
    pub jwt_secret: String,

    /// Token lifetime in seconds.
    pub token_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: 30 * 24 * 60 * 60,
        }
    }
}

/// Route prefix configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Prefix shared by the auth and jobs handler sets.
    pub api_prefix: String,

    /// Path of the documentation UI.
    pub docs_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/v1".to_string(),
            docs_path: "/api-docs".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Length of one counting window in seconds.
    pub window_secs: u64,

    /// Requests admitted per client per window.
    pub max_requests: u32,

    /// Reverse-proxy hops in front of the service whose
    /// X-Forwarded-For entries are trusted.
    pub trusted_proxy_hops: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 15 * 60,
            max_requests: 100,
            trusted_proxy_hops: 1,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,

    /// Maximum JSON body size in bytes.
    pub max_body_bytes: usize,

    /// Origins allowed to call the API. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_bytes: 100 * 1024,
            allowed_origins: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
