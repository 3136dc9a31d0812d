//! Jobs resource. Every handler runs behind the authentication guard and
//! only sees jobs created by the caller.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::http::error::ApiError;
use crate::http::extract::{JobId, ValidJson};
use crate::http::server::AppState;
use crate::storage::{Job, JobStatus, JobUpdate, NewJob};

pub const EMPTY_FIELDS: &str = "Company or Position fields cannot be empty";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_jobs).post(create_job))
        .route("/{id}", get(get_job).patch(update_job).delete(delete_job))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Please provide a company name of at most 50 characters"))]
    pub company: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Please provide a position of at most 100 characters"))]
    pub position: String,

    #[serde(default)]
    pub status: JobStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJobRequest {
    #[validate(length(max = 50, message = "Company name cannot exceed 50 characters"))]
    pub company: Option<String>,

    #[validate(length(max = 100, message = "Position cannot exceed 100 characters"))]
    pub position: Option<String>,

    pub status: Option<JobStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobList {
    pub jobs: Vec<Job>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobResponse {
    pub job: Job,
}

fn job_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("No job with id {id}"))
}

async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<JobList>, ApiError> {
    let jobs = state.storage.jobs.list_jobs(user.user_id).await?;
    Ok(Json(JobList {
        count: jobs.len(),
        jobs,
    }))
}

async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(req): ValidJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job = state
        .storage
        .jobs
        .create_job(
            user.user_id,
            NewJob {
                company: req.company,
                position: req.position,
                status: req.status,
            },
        )
        .await?;

    tracing::debug!(job_id = %job.id, user_id = %user.user_id, "Created job");
    Ok((StatusCode::CREATED, Json(JobResponse { job })))
}

async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    JobId(id): JobId,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state
        .storage
        .jobs
        .get_job(user.user_id, id)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(JobResponse { job }))
}

async fn update_job(
    State(state): State<AppState>,
    user: AuthUser,
    JobId(id): JobId,
    ValidJson(req): ValidJson<UpdateJobRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    let blank = |field: &Option<String>| field.as_deref().is_some_and(str::is_empty);
    if blank(&req.company) || blank(&req.position) {
        return Err(ApiError::Validation(EMPTY_FIELDS.to_string()));
    }

    let update = JobUpdate {
        company: req.company,
        position: req.position,
        status: req.status,
    };
    let job = state
        .storage
        .jobs
        .update_job(user.user_id, id, update)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(JobResponse { job }))
}

async fn delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    JobId(id): JobId,
) -> Result<StatusCode, ApiError> {
    if !state.storage.jobs.delete_job(user.user_id, id).await? {
        return Err(job_not_found(id));
    }
    tracing::debug!(job_id = %id, user_id = %user.user_id, "Deleted job");
    Ok(StatusCode::OK)
}
