use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use jobsift_core::error::FetchError;
use jobsift_core::job::{JobFilter, ReviewStatus};
use jobsift_core::run::{FetchParams, Page, Portal, RunFilter};
use jobsift_core::traits::{JobStore, RunStore, ScrapeProvider};

use crate::auth::{CurrentUser, require_auth};
use crate::dto::{
    ErrorResponse, HealthResponse, JobListResponse, JobResponse, ListJobsQuery, ListRunsQuery,
    RunListResponse, RunResponse, RunSummaryResponse, SyncFromDatasetQuery, SyncJobsRequest,
    SyncJobsResponse, UpdateJobStatusRequest,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router<P, R, J>(state: Arc<AppState<P, R, J>>) -> Router
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let api = Router::new()
        .route("/v1/job-fetcher/sync", post(sync_jobs))
        .route("/v1/job-fetcher/sync-from-dataset", post(sync_from_dataset))
        .route("/v1/job-fetcher/runs", get(list_runs))
        .route("/v1/jobs", get(list_jobs))
        .route("/v1/jobs/{id}", get(get_job))
        .route("/v1/jobs/{id}/status", put(update_job_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<P, R, J>,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

fn parse_portal(portal: Option<&str>) -> Result<Portal, FetchError> {
    match portal {
        None => Ok(Portal::Linkedin),
        Some(s) => s.parse().map_err(FetchError::Validation),
    }
}

fn parse_csv<T>(raw: &str) -> Result<Vec<T>, FetchError>
where
    T: FromStr<Err = String>,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(FetchError::Validation))
        .collect()
}

fn page_from(page: Option<u32>, page_size: Option<u32>) -> Result<Page, FetchError> {
    let page = Page {
        page: page.unwrap_or(1),
        page_size: page_size.unwrap_or(20),
    };
    page.validate()?;
    Ok(page)
}

// ---------------------------------------------------------------------------
// Fetch runs
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/job-fetcher/sync",
    request_body = SyncJobsRequest,
    responses(
        (status = 202, description = "Fetch run started", body = SyncJobsResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "job-fetcher"
)]
pub async fn sync_jobs<P, R, J>(
    State(state): State<Arc<AppState<P, R, J>>>,
    Extension(user): Extension<CurrentUser>,
    axum::Json(body): axum::Json<SyncJobsRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let portal = parse_portal(body.portal.as_deref())?;
    let params = FetchParams {
        title: body.title,
        location: body.location,
        company_names: body.company_names,
        company_ids: body.company_ids,
        published_at: body.published_at,
        rows: body.rows.unwrap_or(50),
    };

    let run = state.orchestrator.start(user.owner_id, portal, params).await?;

    let response = SyncJobsResponse {
        run_id: run.id,
        status: "started".to_string(),
        message: format!("Fetch started for {portal}; poll the run for results"),
    };

    Ok((StatusCode::ACCEPTED, axum::Json(response)))
}

#[utoipa::path(
    post,
    path = "/v1/job-fetcher/sync-from-dataset",
    params(SyncFromDatasetQuery),
    responses(
        (status = 200, description = "Dataset ingested", body = RunSummaryResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Provider error", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "job-fetcher"
)]
pub async fn sync_from_dataset<P, R, J>(
    State(state): State<Arc<AppState<P, R, J>>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SyncFromDatasetQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let portal = parse_portal(query.portal.as_deref())?;
    let summary = state
        .orchestrator
        .start_from_dataset(user.owner_id, portal, &query.dataset_id)
        .await?;

    Ok(axum::Json(RunSummaryResponse::from(summary)))
}

#[utoipa::path(
    get,
    path = "/v1/job-fetcher/runs",
    params(ListRunsQuery),
    responses(
        (status = 200, description = "Run history, newest first", body = RunListResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "job-fetcher"
)]
pub async fn list_runs<P, R, J>(
    State(state): State<Arc<AppState<P, R, J>>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListRunsQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let filter = RunFilter {
        portal: query
            .portal
            .as_deref()
            .map(|s| s.parse().map_err(FetchError::Validation))
            .transpose()?,
        status: query
            .status
            .as_deref()
            .map(|s| s.parse().map_err(FetchError::Validation))
            .transpose()?,
    };
    let page = page_from(query.page, query.page_size)?;

    let (runs, total) = state.runs.list_runs(user.owner_id, &filter, &page).await?;

    let response = RunListResponse {
        runs: runs.into_iter().map(RunResponse::from).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages(total),
    };

    Ok(axum::Json(response))
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Stored job postings", body = JobListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "jobs"
)]
pub async fn list_jobs<P, R, J>(
    State(state): State<Arc<AppState<P, R, J>>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListJobsQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let filter = JobFilter {
        portals: query.portal.as_deref().map(parse_csv).transpose()?,
        statuses: query.status.as_deref().map(parse_csv).transpose()?,
        location: query.location,
        min_salary: query.min_salary,
        company: query.company,
        query: query.q,
        sort: query
            .sort
            .as_deref()
            .map(|s| s.parse().map_err(FetchError::Validation))
            .transpose()?
            .unwrap_or_default(),
        sort_desc: query.sort_desc.unwrap_or(true),
    };
    let page = page_from(query.page, query.page_size)?;

    let (jobs, total) = state.jobs.list_jobs(user.owner_id, &filter, &page).await?;

    let response = JobListResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages(total),
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job details", body = JobResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "jobs"
)]
pub async fn get_job<P, R, J>(
    State(state): State<Arc<AppState<P, R, J>>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let job = state.jobs.get_job(user.owner_id, id).await?;

    match job {
        Some(job) => Ok(axum::Json(JobResponse::from(job)).into_response()),
        None => {
            let body = ErrorResponse {
                error: "not_found".to_string(),
                message: format!("Job not found: {id}"),
            };
            Ok((StatusCode::NOT_FOUND, axum::Json(body)).into_response())
        }
    }
}

#[utoipa::path(
    put,
    path = "/v1/jobs/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobStatusRequest,
    responses(
        (status = 200, description = "Updated job", body = JobResponse),
        (status = 400, description = "Status not settable", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "jobs"
)]
pub async fn update_job_status<P, R, J>(
    State(state): State<Arc<AppState<P, R, J>>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<UpdateJobStatusRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let status: ReviewStatus = body.status.parse().map_err(FetchError::Validation)?;

    // Reject before touching the store; applied/expired belong to other flows.
    if !status.caller_settable() {
        return Err(FetchError::Validation(format!(
            "Status '{status}' cannot be set through this endpoint; allowed: reviewed, queued, skipped"
        ))
        .into());
    }

    let job = state
        .jobs
        .update_job_status(user.owner_id, id, status)
        .await?;

    match job {
        Some(job) => Ok(axum::Json(JobResponse::from(job)).into_response()),
        None => {
            let body = ErrorResponse {
                error: "not_found".to_string(),
                message: format!("Job not found: {id}"),
            };
            Ok((StatusCode::NOT_FOUND, axum::Json(body)).into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health<P, R, J>(State(state): State<Arc<AppState<P, R, J>>>) -> impl IntoResponse
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    let db_status = match state.runs.health_check().await {
        Ok(()) => "ok",
        Err(_) => "error",
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        database: db_status,
    };

    (status, axum::Json(response))
}
