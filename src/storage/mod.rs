//! Storage collaborator.
//!
//! # Data Flow
//! ```text
//! startup:
//!     STORAGE_URI → StorageConnector::connect → Storage (single shared handle)
//!
//! per request:
//!     handler → Storage.users / Storage.jobs → StorageError
//!             → http::error classifies (duplicate → 400, rest → 500)
//! ```
//!
//! The pipeline only sees the two narrow traits below. Pooling, schema and
//! query semantics belong to the implementations.

pub mod memory;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::{MemoryConnector, MemoryStore};
pub use models::{Job, JobStatus, JobUpdate, NewJob, NewUser, User};

/// Errors raised by the storage layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("unsupported storage scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("storage unreachable: {0}")]
    Unreachable(String),

    #[error("duplicate value for unique field {field}")]
    Duplicate { field: String },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with `Duplicate { field: "email" }` when
    /// the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
}

/// Job persistence. Every operation is scoped to the owning user.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Jobs owned by `owner`, oldest first.
    async fn list_jobs(&self, owner: Uuid) -> Result<Vec<Job>, StorageError>;

    async fn get_job(&self, owner: Uuid, id: Uuid) -> Result<Option<Job>, StorageError>;

    async fn create_job(&self, owner: Uuid, job: NewJob) -> Result<Job, StorageError>;

    async fn update_job(
        &self,
        owner: Uuid,
        id: Uuid,
        update: JobUpdate,
    ) -> Result<Option<Job>, StorageError>;

    /// Returns false when no job matched.
    async fn delete_job(&self, owner: Uuid, id: Uuid) -> Result<bool, StorageError>;
}

/// The connected storage handle shared by all requests.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub jobs: Arc<dyn JobStore>,
}

impl Storage {
    pub fn new(users: Arc<dyn UserStore>, jobs: Arc<dyn JobStore>) -> Self {
        Self { users, jobs }
    }
}

/// Establishes the storage connection at startup.
#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn connect(&self, uri: &str) -> Result<Storage, StorageError>;
}
