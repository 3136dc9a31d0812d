//! Input sanitization.
//!
//! # Responsibilities
//! - Escape markup in JSON body strings and keys
//! - Escape markup in query keys and values
//! - Escape markup in path segments
//!
//! Runs before routing, so path parameters, query extractors and the JSON
//! body stage only ever see escaped input. It never fails on content: bodies
//! that are not JSON, or not valid JSON, pass through unchanged.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, Uri},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;

use crate::http::error::ApiError;

/// Replace characters that open or close markup with HTML entities.
pub fn escape_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn needs_escape(input: &str) -> bool {
    input.contains(|c: char| c == '<' || c == '>')
}

/// Recursively escape every string (and object key) in a JSON value.
/// Returns true if anything changed.
pub fn sanitize_json(value: &mut Value) -> bool {
    match value {
        Value::String(s) if needs_escape(s.as_str()) => {
            *s = escape_markup(s);
            true
        }
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| sanitize_json(item) | changed),
        Value::Object(map) => {
            let mut changed = false;
            let entries = std::mem::take(map);
            for (key, mut item) in entries {
                changed |= sanitize_json(&mut item);
                let key = if needs_escape(&key) {
                    changed = true;
                    escape_markup(&key)
                } else {
                    key
                };
                map.insert(key, item);
            }
            changed
        }
        _ => false,
    }
}

/// Escape markup in a query string. Returns `None` when nothing changed.
pub fn sanitize_query(query: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !pairs
        .iter()
        .any(|(k, v)| needs_escape(k) || needs_escape(v))
    {
        return None;
    }

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in &pairs {
        serializer.append_pair(&escape_markup(k), &escape_markup(v));
    }
    Some(serializer.finish())
}

/// Escape markup in path segments. Returns `None` when nothing changed.
pub fn sanitize_path(path: &str) -> Option<String> {
    let mut changed = false;
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| match urlencoding::decode(segment) {
            Ok(decoded) if needs_escape(&decoded) => {
                changed = true;
                urlencoding::encode(&escape_markup(&decoded)).into_owned()
            }
            _ => segment.to_string(),
        })
        .collect();

    changed.then(|| segments.join("/"))
}

fn sanitize_uri(uri: &Uri) -> Option<Uri> {
    let path = sanitize_path(uri.path());
    let query = uri.query().and_then(sanitize_query);
    if path.is_none() && query.is_none() {
        return None;
    }

    let path = path.unwrap_or_else(|| uri.path().to_string());
    let path_and_query = match query.as_deref().or(uri.query()) {
        Some(q) => format!("{path}?{q}"),
        None => path,
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = path_and_query.parse().ok();
    Uri::from_parts(parts).ok()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let mime = v.split(';').next().unwrap_or("").trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Middleware: sanitize URI and JSON body. State is the body size limit.
pub async fn sanitize_middleware(
    State(max_body_bytes): State<usize>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    if let Some(uri) = sanitize_uri(&parts.uri) {
        tracing::debug!(original = %parts.uri, sanitized = %uri, "Escaped markup in URI");
        parts.uri = uri;
    }

    let body = if is_json(&parts.headers) {
        let bytes = read_limited(body, max_body_bytes).await?;
        let bytes = sanitize_body(bytes);
        parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        Body::from(bytes)
    } else {
        body
    };

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Buffer at most `limit` bytes. Only exceeding the limit is a 413; any
/// other read failure is a bad request.
async fn read_limited(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(ApiError::PayloadTooLarge { limit }),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            Err(ApiError::Validation("Failed to read request body".to_string()))
        }
    }
}

fn sanitize_body(bytes: Bytes) -> Bytes {
    let Ok(mut value) = serde_json::from_slice::<Value>(&bytes) else {
        return bytes;
    };
    if !sanitize_json(&mut value) {
        return bytes;
    }
    match serde_json::to_vec(&value) {
        Ok(rewritten) => Bytes::from(rewritten),
        Err(_) => bytes,
    }
}
