use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobsift API",
        version = "0.2.0",
        description = "Job-posting fetch orchestration with provider polling and deduplicated storage."
    ),
    paths(
        crate::routes::sync_jobs,
        crate::routes::sync_from_dataset,
        crate::routes::list_runs,
        crate::routes::list_jobs,
        crate::routes::get_job,
        crate::routes::update_job_status,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::SyncJobsRequest,
        crate::dto::SyncJobsResponse,
        crate::dto::RunSummaryResponse,
        crate::dto::RunResponse,
        crate::dto::RunListResponse,
        crate::dto::JobResponse,
        crate::dto::JobListResponse,
        crate::dto::UpdateJobStatusRequest,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "job-fetcher", description = "Fetch-run orchestration"),
        (name = "jobs", description = "Stored job postings"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Caller JWT signed with JOBSIFT_JWT_SECRET.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
