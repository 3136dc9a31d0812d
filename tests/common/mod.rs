//! Shared utilities for pipeline and lifecycle tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
};
use jobs_api::config::AppConfig;
use jobs_api::http::{AppService, ErrorEnvelope, HttpServer};
use jobs_api::storage::{
    Job, JobStore, JobUpdate, MemoryStore, NewJob, Storage, StorageError,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const PEER: ([u8; 4], u16) = ([203, 0, 113, 7], 40000);

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.storage.uri = "memory://tests".to_string();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config
}

pub fn build_service(config: &AppConfig, storage: Storage) -> AppService {
    HttpServer::new(config, storage)
        .expect("route table should build")
        .service()
}

pub fn memory_service() -> AppService {
    build_service(&test_config(), MemoryStore::new().into_storage())
}

/// Build a request as if it arrived from `PEER`.
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let mut req = builder.body(body).unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(PEER)));
    req
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        serde_json::from_slice(&self.body).expect("response body should be an error envelope")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

pub async fn send(service: &AppService, req: Request<Body>) -> TestResponse {
    let response = service.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body,
    }
}

/// Register an account and return its bearer token.
pub async fn register(service: &AppService, name: &str, email: &str) -> String {
    let response = send(
        service,
        request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(serde_json::json!({ "name": name, "email": email, "password": "secret123" })),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    response.json()["token"].as_str().unwrap().to_string()
}

/// Job store whose every operation fails asynchronously.
pub struct FailingJobs;

#[async_trait]
impl JobStore for FailingJobs {
    async fn list_jobs(&self, _owner: Uuid) -> Result<Vec<Job>, StorageError> {
        tokio::task::yield_now().await;
        Err(StorageError::Backend("connection reset".to_string()))
    }

    async fn get_job(&self, _owner: Uuid, _id: Uuid) -> Result<Option<Job>, StorageError> {
        Err(StorageError::Backend("connection reset".to_string()))
    }

    async fn create_job(&self, _owner: Uuid, _job: NewJob) -> Result<Job, StorageError> {
        Err(StorageError::Backend("connection reset".to_string()))
    }

    async fn update_job(
        &self,
        _owner: Uuid,
        _id: Uuid,
        _update: JobUpdate,
    ) -> Result<Option<Job>, StorageError> {
        Err(StorageError::Backend("connection reset".to_string()))
    }

    async fn delete_job(&self, _owner: Uuid, _id: Uuid) -> Result<bool, StorageError> {
        Err(StorageError::Backend("connection reset".to_string()))
    }
}

/// Job store that panics inside the handler's await.
pub struct PanickingJobs;

#[async_trait]
impl JobStore for PanickingJobs {
    async fn list_jobs(&self, _owner: Uuid) -> Result<Vec<Job>, StorageError> {
        tokio::task::yield_now().await;
        panic!("store invariant violated");
    }

    async fn get_job(&self, _owner: Uuid, _id: Uuid) -> Result<Option<Job>, StorageError> {
        panic!("store invariant violated");
    }

    async fn create_job(&self, _owner: Uuid, _job: NewJob) -> Result<Job, StorageError> {
        panic!("store invariant violated");
    }

    async fn update_job(
        &self,
        _owner: Uuid,
        _id: Uuid,
        _update: JobUpdate,
    ) -> Result<Option<Job>, StorageError> {
        panic!("store invariant violated");
    }

    async fn delete_job(&self, _owner: Uuid, _id: Uuid) -> Result<bool, StorageError> {
        panic!("store invariant violated");
    }
}

/// Storage with working accounts and the given job store.
pub fn storage_with_jobs(jobs: Arc<dyn JobStore>) -> Storage {
    let memory = MemoryStore::new().into_storage();
    Storage::new(memory.users, jobs)
}
