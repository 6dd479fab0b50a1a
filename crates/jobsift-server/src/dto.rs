use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jobsift_core::job::FetchedJob;
use jobsift_core::run::{FetchRun, RunSummary};

// ---------------------------------------------------------------------------
// Fetch runs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SyncJobsRequest {
    /// Portal to scrape (defaults to linkedin).
    pub portal: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub company_names: Option<Vec<String>>,
    pub company_ids: Option<Vec<String>>,
    /// Provider-side posting-date filter, passed through unchanged.
    pub published_at: Option<String>,
    /// Result budget, 1-100 (default: 50).
    pub rows: Option<u32>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SyncJobsResponse {
    pub run_id: Uuid,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SyncFromDatasetQuery {
    /// Existing provider dataset to ingest.
    pub dataset_id: String,
    /// Portal the dataset was scraped from (defaults to linkedin).
    pub portal: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunSummaryResponse {
    pub run_id: Uuid,
    pub status: String,
    pub jobs_found: i32,
    pub new_jobs_added: i32,
}

impl From<RunSummary> for RunSummaryResponse {
    fn from(summary: RunSummary) -> Self {
        Self {
            run_id: summary.run_id,
            status: summary.status.to_string(),
            jobs_found: summary.jobs_found,
            new_jobs_added: summary.new_jobs_added,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunResponse {
    pub id: Uuid,
    pub portal: String,
    pub status: String,
    pub params: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub jobs_found: i32,
    pub new_jobs_added: i32,
    pub error: Option<serde_json::Value>,
}

impl From<FetchRun> for RunResponse {
    fn from(run: FetchRun) -> Self {
        Self {
            id: run.id,
            portal: run.portal.to_string(),
            status: run.status.to_string(),
            params: run.params,
            started_at: run.started_at,
            finished_at: run.finished_at,
            jobs_found: run.jobs_found,
            new_jobs_added: run.new_jobs_added,
            error: run.error,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListRunsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub portal: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunListResponse {
    pub runs: Vec<RunResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: i64,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobResponse {
    pub id: Uuid,
    pub fetch_run_id: Uuid,
    pub portal: String,
    pub external_job_id: String,
    pub title: String,
    pub company: String,
    pub company_id: Option<String>,
    pub company_url: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_text: Option<String>,
    pub job_url: String,
    pub apply_url: Option<String>,
    pub apply_type: Option<String>,
    pub description: Option<String>,
    pub contract_type: Option<String>,
    pub experience_level: Option<String>,
    pub work_type: Option<String>,
    pub sector: Option<String>,
    pub benefits: Option<String>,
    pub applications_count: Option<String>,
    pub posted_at: Option<NaiveDate>,
    pub posted_time_text: Option<String>,
    pub status: String,
    pub fetched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FetchedJob> for JobResponse {
    fn from(job: FetchedJob) -> Self {
        Self {
            id: job.id,
            fetch_run_id: job.fetch_run_id,
            portal: job.portal.to_string(),
            external_job_id: job.external_job_id,
            title: job.title,
            company: job.company,
            company_id: job.company_id,
            company_url: job.company_url,
            location: job.location,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            salary_text: job.salary_text,
            job_url: job.job_url,
            apply_url: job.apply_url,
            apply_type: job.apply_type,
            description: job.description,
            contract_type: job.contract_type,
            experience_level: job.experience_level,
            work_type: job.work_type,
            sector: job.sector,
            benefits: job.benefits,
            applications_count: job.applications_count,
            posted_at: job.posted_at,
            posted_time_text: job.posted_time_text,
            status: job.status.to_string(),
            fetched_at: job.fetched_at,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListJobsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Comma-separated portal list.
    pub portal: Option<String>,
    /// Comma-separated review-status list.
    pub status: Option<String>,
    /// Free-text search over title and company.
    pub q: Option<String>,
    pub location: Option<String>,
    pub min_salary: Option<f64>,
    pub company: Option<String>,
    /// Sort column; must be one of the whitelisted names.
    pub sort: Option<String>,
    pub sort_desc: Option<bool>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateJobStatusRequest {
    /// One of: reviewed, queued, skipped.
    pub status: String,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
