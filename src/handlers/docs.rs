//! API documentation: a Swagger UI page and the OpenAPI document it loads.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::server::AppState;

const OPENAPI_DOCUMENT: &str = include_str!("../../assets/openapi.json");

const SWAGGER_UI_VERSION: &str = "5";

/// The UI pulls its assets from a CDN and bootstraps with an inline script.
const DOCS_CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' https://unpkg.com; \
    style-src 'self' 'unsafe-inline' https://unpkg.com; \
    img-src 'self' data: https:; \
    connect-src 'self'; \
    object-src 'none'; \
    frame-ancestors 'self'";

/// Routes for the UI (at the docs path and any subpath under it) and the
/// document.
pub fn router(docs_path: &str) -> Router<AppState> {
    let document_url = format!("{docs_path}/openapi.json");
    let page = render_page(&document_url);

    let ui = move || {
        let page = page.clone();
        async move { ui_response(page) }
    };

    Router::new()
        .route(docs_path, get(ui.clone()))
        .route(&format!("{docs_path}/"), get(ui.clone()))
        .route(&format!("{docs_path}/{{*rest}}"), get(ui))
        .route(&document_url, get(document))
}

fn ui_response(page: String) -> Response {
    let mut response = Html(page).into_response();
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(DOCS_CONTENT_SECURITY_POLICY),
    );
    response
}

async fn document(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    openapi_document(state.routes.api_prefix()).map(Json)
}

/// The embedded document with its server URL pointed at `api_prefix`.
pub fn openapi_document(api_prefix: &str) -> Result<Value, ApiError> {
    let mut document: Value = serde_json::from_str(OPENAPI_DOCUMENT)
        .map_err(|e| ApiError::Internal(format!("embedded OpenAPI document: {e}")))?;
    document["servers"] = serde_json::json!([{ "url": api_prefix }]);
    Ok(document)
}

pub fn render_page(document_url: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<title>Jobs API Documentation</title>
<link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}/swagger-ui.css" />
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}/swagger-ui-bundle.js" crossorigin></script>
<script>
window.onload = () => {{
  window.ui = SwaggerUIBundle({{ url: "{document_url}", dom_id: "#swagger-ui" }});
}};
</script>
</body>
</html>
"##
    )
}
