//! End-to-end behaviour of the request pipeline, dispatched in-process.

use std::sync::Arc;

use axum::http::{header, Method, StatusCode};
use jobs_api::storage::MemoryStore;
use serde_json::json;

mod common;

use common::{
    build_service, memory_service, register, request, send, storage_with_jobs, test_config,
    FailingJobs, PanickingJobs,
};

#[tokio::test]
async fn root_page_links_to_documentation() {
    let service = memory_service();
    let response = send(&service, request(Method::GET, "/", None, None)).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Jobs API"));
    assert!(body.contains("href=\"/api-docs\""));
}

#[tokio::test]
async fn rate_limit_admits_one_hundred_then_rejects() {
    let service = memory_service();

    for i in 0..100 {
        let response = send(&service, request(Method::GET, "/api/v1/jobs", None, None)).await;
        assert_ne!(
            response.status,
            StatusCode::TOO_MANY_REQUESTS,
            "request {} should pass the limiter",
            i + 1
        );
    }

    let response = send(&service, request(Method::GET, "/api/v1/jobs", None, None)).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers.contains_key(header::RETRY_AFTER));
    assert_eq!(response.envelope().status_code, 429);
}

#[tokio::test]
async fn rate_limit_precedes_routing_and_auth() {
    let mut config = test_config();
    config.rate_limit.max_requests = 1;
    let service = build_service(&config, MemoryStore::new().into_storage());

    send(&service, request(Method::GET, "/", None, None)).await;
    let response = send(&service, request(Method::GET, "/no/such/route", None, None)).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn forwarded_clients_are_limited_separately() {
    let mut config = test_config();
    config.rate_limit.max_requests = 1;
    let service = build_service(&config, MemoryStore::new().into_storage());

    let from = |client: &'static str| {
        let mut req = request(Method::GET, "/", None, None);
        req.headers_mut()
            .insert("x-forwarded-for", client.parse().unwrap());
        req
    };

    assert_eq!(send(&service, from("198.51.100.1")).await.status, StatusCode::OK);
    assert_eq!(send(&service, from("198.51.100.2")).await.status, StatusCode::OK);
    assert_eq!(
        send(&service, from("198.51.100.1")).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn jobs_without_credential_are_unauthenticated() {
    let service = memory_service();

    for token in [None, Some("not-a-jwt")] {
        let response = send(&service, request(Method::GET, "/api/v1/jobs", token, None)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        let envelope = response.envelope();
        assert_eq!(envelope.status_code, 401);
        assert_eq!(envelope.message, "Authentication invalid");
    }
}

#[tokio::test]
async fn auth_routes_are_never_guarded() {
    let service = memory_service();
    let response = send(
        &service,
        request(
            Method::POST,
            "/api/v1/auth/login",
            Some("garbage"),
            Some(json!({ "email": "nobody@example.com", "password": "whatever" })),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.envelope().message, "Invalid Credentials");
}

#[tokio::test]
async fn unknown_path_yields_single_not_found_envelope() {
    let service = memory_service();

    for method in [Method::GET, Method::POST, Method::DELETE] {
        let response = send(&service, request(method, "/api/v2/anything", None, None)).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(
            response.json(),
            json!({ "message": "Route does not exist", "statusCode": 404 })
        );
    }
}

#[tokio::test]
async fn wrong_method_on_known_path_is_not_found() {
    let service = memory_service();
    let response = send(&service, request(Method::DELETE, "/", None, None)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(!response.headers.contains_key(header::ALLOW));
    assert_eq!(response.envelope().message, "Route does not exist");
}

#[tokio::test]
async fn async_store_failure_becomes_generic_envelope() {
    let service = build_service(&test_config(), storage_with_jobs(Arc::new(FailingJobs)));
    let token = register(&service, "Grace Hopper", "grace@example.com").await;

    let response = send(&service, request(Method::GET, "/api/v1/jobs", Some(&token), None)).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json(),
        json!({ "message": "Something went wrong try again later", "statusCode": 500 })
    );
}

#[tokio::test]
async fn handler_panic_becomes_generic_envelope() {
    let service = build_service(&test_config(), storage_with_jobs(Arc::new(PanickingJobs)));
    let token = register(&service, "Grace Hopper", "grace@example.com").await;

    let response = send(&service, request(Method::GET, "/api/v1/jobs", Some(&token), None)).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.envelope().message, "Something went wrong try again later");
}

#[tokio::test]
async fn markup_in_body_is_escaped_before_handlers() {
    let service = memory_service();
    let token = register(&service, "Ada Lovelace", "ada@example.com").await;

    let response = send(
        &service,
        request(
            Method::POST,
            "/api/v1/jobs",
            Some(&token),
            Some(json!({ "company": "<script>x</script>", "position": "Engineer" })),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.json()["job"]["company"],
        "&lt;script&gt;x&lt;/script&gt;"
    );
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let service = memory_service();
    let mut req = request(Method::POST, "/api/v1/auth/register", None, None);
    req.headers_mut()
        .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    *req.body_mut() = axum::body::Body::from("{\"name\":");

    let response = send(&service, req).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.envelope().status_code, 400);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = test_config();
    config.security.max_body_bytes = 64;
    let service = build_service(&config, MemoryStore::new().into_storage());

    let response = send(
        &service,
        request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": "x".repeat(200), "email": "a@b.c", "password": "secret123" })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.envelope().status_code, 413);
}

#[tokio::test]
async fn configured_body_limit_applies_above_two_mebibytes() {
    let mut config = test_config();
    config.security.max_body_bytes = 4 * 1024 * 1024;
    let service = build_service(&config, MemoryStore::new().into_storage());

    let login = |password: String| {
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": password })),
        )
    };

    let within = send(&service, login("x".repeat(3 * 1024 * 1024))).await;
    assert_eq!(within.status, StatusCode::UNAUTHORIZED);
    assert_eq!(within.envelope().message, "Invalid Credentials");

    let beyond = send(&service, login("x".repeat(5 * 1024 * 1024))).await;
    assert_eq!(beyond.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(beyond.envelope().status_code, 413);
}

#[tokio::test]
async fn security_headers_on_success_and_error() {
    let service = memory_service();

    for uri in ["/", "/missing"] {
        let response = send(&service, request(Method::GET, uri, None, None)).await;
        assert_eq!(
            response.headers.get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert!(response.headers.contains_key("content-security-policy"));
        assert!(response.headers.contains_key("x-frame-options"));
        assert!(response.headers.contains_key("x-request-id"));
    }
}

#[tokio::test]
async fn docs_page_and_document_are_served() {
    let service = memory_service();

    let page = send(&service, request(Method::GET, "/api-docs", None, None)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.text().contains("/api-docs/openapi.json"));
    let csp = page.headers.get("content-security-policy").unwrap();
    assert!(csp.to_str().unwrap().contains("unpkg.com"));

    let document = send(&service, request(Method::GET, "/api-docs/openapi.json", None, None)).await;
    assert_eq!(document.status, StatusCode::OK);
    assert_eq!(document.json()["servers"][0]["url"], "/api/v1");
}

#[tokio::test]
async fn docs_subpaths_serve_the_page() {
    let service = memory_service();

    for uri in ["/api-docs/", "/api-docs/index.html", "/api-docs/static/deep/path"] {
        let page = send(&service, request(Method::GET, uri, None, None)).await;
        assert_eq!(page.status, StatusCode::OK, "{uri}");
        assert!(page.text().contains("swagger-ui-bundle.js"));
    }

    let document = send(&service, request(Method::GET, "/api-docs/openapi.json", None, None)).await;
    assert_eq!(document.json()["servers"][0]["url"], "/api/v1");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let service = memory_service();
    register(&service, "First User", "dup@example.com").await;

    let response = send(
        &service,
        request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": "Second User", "email": "DUP@example.com", "password": "secret123" })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.envelope().message.contains("email"));
}

#[tokio::test]
async fn login_requires_both_fields() {
    let service = memory_service();
    let response = send(
        &service,
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com" })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.envelope().message, "Please provide email and password");
}

#[tokio::test]
async fn jobs_crud_flow() {
    let service = memory_service();
    register(&service, "Ada Lovelace", "ada@example.com").await;

    let login = send(
        &service,
        request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret123" })),
        ),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.json()["user"]["name"], "Ada Lovelace");
    let token = login.json()["token"].as_str().unwrap().to_string();
    let token = Some(token.as_str());

    let created = send(
        &service,
        request(
            Method::POST,
            "/api/v1/jobs",
            token,
            Some(json!({ "company": "Analytical Engines", "position": "Programmer" })),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let job = created.json()["job"].clone();
    assert_eq!(job["status"], "pending");
    let id = job["id"].as_str().unwrap().to_string();
    let job_uri = format!("/api/v1/jobs/{id}");

    let listed = send(&service, request(Method::GET, "/api/v1/jobs", token, None)).await;
    assert_eq!(listed.json()["count"], 1);

    let patched = send(
        &service,
        request(Method::PATCH, &job_uri, token, Some(json!({ "status": "interview" }))),
    )
    .await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.json()["job"]["status"], "interview");

    let blank = send(
        &service,
        request(Method::PATCH, &job_uri, token, Some(json!({ "company": "" }))),
    )
    .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        blank.envelope().message,
        "Company or Position fields cannot be empty"
    );

    let other = register(&service, "Charles Babbage", "charles@example.com").await;
    let hidden = send(&service, request(Method::GET, &job_uri, Some(&other), None)).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
    assert_eq!(hidden.envelope().message, format!("No job with id {id}"));

    let deleted = send(&service, request(Method::DELETE, &job_uri, token, None)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert!(deleted.body.is_empty());

    let gone = send(&service, request(Method::GET, &job_uri, token, None)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_job_id_is_cast_error() {
    let service = memory_service();
    let token = register(&service, "Ada Lovelace", "ada@example.com").await;

    let response = send(
        &service,
        request(Method::GET, "/api/v1/jobs/not-a-uuid", Some(&token), None),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.envelope().message, "No item found with id : not-a-uuid");
}
