//! In-process storage backend.
//!
//! Selected with `memory://<name>` connection strings. Contents live as long
//! as the process.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use url::Url;
use uuid::Uuid;

use crate::storage::{
    Job, JobStore, JobUpdate, NewJob, NewUser, Storage, StorageConnector, StorageError, User,
    UserStore,
};

/// Concurrent map-backed store implementing both collaborator traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    /// Lowercased email → user id. The entry lock makes registration atomic.
    emails: DashMap<String, Uuid>,
    jobs: DashMap<Uuid, Job>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh store into a `Storage` handle.
    pub fn into_storage(self) -> Storage {
        let store = Arc::new(self);
        Storage::new(store.clone(), store)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        let key = user.email.to_lowercase();
        match self.emails.entry(key) {
            Entry::Occupied(_) => Err(StorageError::Duplicate {
                field: "email".to_string(),
            }),
            Entry::Vacant(slot) => {
                let record = User {
                    id: Uuid::new_v4(),
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                };
                self.users.insert(record.id, record.clone());
                slot.insert(record.id);
                Ok(record)
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let Some(id) = self.emails.get(&email.to_lowercase()).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list_jobs(&self, owner: Uuid) -> Result<Vec<Job>, StorageError> {
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .filter(|r| r.value().created_by == owner)
            .map(|r| r.value().clone())
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(jobs)
    }

    async fn get_job(&self, owner: Uuid, id: Uuid) -> Result<Option<Job>, StorageError> {
        Ok(self
            .jobs
            .get(&id)
            .filter(|r| r.value().created_by == owner)
            .map(|r| r.value().clone()))
    }

    async fn create_job(&self, owner: Uuid, job: NewJob) -> Result<Job, StorageError> {
        let now = Utc::now();
        let record = Job {
            id: Uuid::new_v4(),
            company: job.company,
            position: job.position,
            status: job.status,
            created_by: owner,
            created_at: now,
            updated_at: now,
        };
        self.jobs.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_job(
        &self,
        owner: Uuid,
        id: Uuid,
        update: JobUpdate,
    ) -> Result<Option<Job>, StorageError> {
        let Some(mut job) = self.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if job.created_by != owner {
            return Ok(None);
        }
        update.apply(&mut *job);
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, owner: Uuid, id: Uuid) -> Result<bool, StorageError> {
        Ok(self
            .jobs
            .remove_if(&id, |_, job| job.created_by == owner)
            .is_some())
    }
}

/// Connector for `memory://` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryConnector;

#[async_trait]
impl StorageConnector for MemoryConnector {
    async fn connect(&self, uri: &str) -> Result<Storage, StorageError> {
        let parsed = Url::parse(uri).map_err(|e| StorageError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.scheme() != "memory" {
            return Err(StorageError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        tracing::info!(
            database = parsed.host_str().unwrap_or("default"),
            "Connected to in-memory storage"
        );
        Ok(MemoryStore::new().into_storage())
    }
}
