//! Cross-origin policy.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::SecurityConfig;

/// Build the CORS layer. Only an empty origin list allows any origin; a
/// configured list never widens to a wildcard, even if entries are dropped.
pub fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    let allow_origin = if config.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn config(origins: &[&str]) -> SecurityConfig {
        SecurityConfig {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            ..SecurityConfig::default()
        }
    }

    async fn allow_origin_for(config: &SecurityConfig, origin: &str) -> Option<HeaderValue> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(config));
        let request = Request::builder()
            .uri("/")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn empty_list_allows_any_origin() {
        let value = allow_origin_for(&config(&[]), "https://anywhere.example").await;
        assert_eq!(value.unwrap(), "*");
    }

    #[tokio::test]
    async fn listed_origin_is_echoed() {
        let config = config(&["https://app.example.com", "https://admin.example.com"]);
        let value = allow_origin_for(&config, "https://admin.example.com").await;
        assert_eq!(value.unwrap(), "https://admin.example.com");
    }

    #[tokio::test]
    async fn unlisted_origin_gets_no_grant() {
        let config = config(&["https://app.example.com"]);
        let value = allow_origin_for(&config, "https://evil.example").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn unparsable_list_never_becomes_wildcard() {
        let config = config(&["https://good.example\u{7f}"]);
        let value = allow_origin_for(&config, "https://evil.example").await;
        assert!(value.is_none());
    }
}
