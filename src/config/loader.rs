//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{AppConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then `.env` and process
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay recognized environment variables onto `config`.
///
/// `lookup` abstracts the environment so callers can supply their own source.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HOST") {
        config.listener.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.listener.port = parse_env("PORT", &port)?;
    }

    if let Some(uri) = lookup("STORAGE_URI").or_else(|| lookup("MONGO_URI")) {
        config.storage.uri = uri;
    }

    if let Some(secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(lifetime) = lookup("JWT_LIFETIME") {
        config.auth.token_lifetime_secs =
            parse_duration_secs(&lifetime).ok_or(ConfigError::InvalidEnv {
                key: "JWT_LIFETIME",
                value: lifetime,
            })?;
    }

    if let Some(prefix) = lookup("API_PREFIX") {
        config.routes.api_prefix = prefix;
    }
    if let Some(path) = lookup("DOCS_PATH") {
        config.routes.docs_path = path;
    }

    if let Some(enabled) = lookup("RATE_LIMIT_ENABLED") {
        config.rate_limit.enabled = parse_env("RATE_LIMIT_ENABLED", &enabled)?;
    }
    if let Some(window) = lookup("RATE_LIMIT_WINDOW_SECS") {
        config.rate_limit.window_secs = parse_env("RATE_LIMIT_WINDOW_SECS", &window)?;
    }
    if let Some(max) = lookup("RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = parse_env("RATE_LIMIT_MAX", &max)?;
    }
    if let Some(hops) = lookup("TRUSTED_PROXY_HOPS") {
        config.rate_limit.trusted_proxy_hops = parse_env("TRUSTED_PROXY_HOPS", &hops)?;
    }

    if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(limit) = lookup("MAX_BODY_BYTES") {
        config.security.max_body_bytes = parse_env("MAX_BODY_BYTES", &limit)?;
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::InvalidEnv {
                    key: "LOG_FORMAT",
                    value: format,
                })
            }
        };
    }
    if let Some(addr) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr;
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_string(),
    })
}

/// Parse a short duration such as `30d`, `12h`, `45m`, `90s` or `3600`
/// into seconds.
pub fn parse_duration_secs(value: &str) -> Option<u64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().ok()?;

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };

    amount.checked_mul(multiplier)
}
