//! Stored records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Application status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Interview,
    Declined,
    #[default]
    Pending,
}

/// A job application owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub company: String,
    pub position: String,
    pub status: JobStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub company: String,
    pub position: String,
    pub status: JobStatus,
}

/// Partial update of a job. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<JobStatus>,
}

impl JobUpdate {
    /// Apply this update to `job`, bumping `updated_at`.
    pub fn apply(self, job: &mut Job) {
        if let Some(company) = self.company {
            job.company = company;
        }
        if let Some(position) = self.position {
            job.position = position;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        job.updated_at = Utc::now();
    }
}
