use std::future::Future;

use uuid::Uuid;

use crate::error::FetchError;
use crate::job::{FetchedJob, JobFilter, JobRecord, ReviewStatus};
use crate::provider::RemoteRunState;
use crate::run::{FetchParams, FetchRun, NewFetchRun, Page, RunCompletion, RunFilter};

/// Client for the external scraping provider.
///
/// Three remote operations: start a scrape run, poll its status, and fetch
/// result items. Each call carries its own transport-level timeout,
/// independent of the orchestrator's poll budget.
pub trait ScrapeProvider: Send + Sync + Clone {
    /// Submit scrape parameters and return the opaque remote run id.
    fn start_run(
        &self,
        params: &FetchParams,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;

    fn poll_status(
        &self,
        remote_run_id: &str,
    ) -> impl Future<Output = Result<RemoteRunState, FetchError>> + Send;

    /// Fetch the raw, ungrouped result items of a run. Valid only after the
    /// run reported SUCCEEDED.
    fn fetch_results(
        &self,
        remote_run_id: &str,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, FetchError>> + Send;

    /// Fetch items directly from a known result-set id, bypassing the run.
    /// Used for replaying/testing without re-invoking the remote scraper.
    fn fetch_dataset_items(
        &self,
        dataset_id: &str,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, FetchError>> + Send;
}

/// Persistence for fetch-run records.
pub trait RunStore: Send + Sync + Clone {
    /// Insert a new run in the Running state.
    fn create_run(
        &self,
        new_run: NewFetchRun,
    ) -> impl Future<Output = Result<FetchRun, FetchError>> + Send;

    /// Finalize a run exactly once: terminal status, counts, error payload,
    /// finished timestamp. A no-op for runs already terminal.
    fn finalize_run(
        &self,
        run_id: Uuid,
        completion: &RunCompletion,
    ) -> impl Future<Output = Result<(), FetchError>> + Send;

    fn get_run(
        &self,
        owner_id: Uuid,
        run_id: Uuid,
    ) -> impl Future<Output = Result<Option<FetchRun>, FetchError>> + Send;

    /// List runs for an owner, started_at descending, with the total count.
    fn list_runs(
        &self,
        owner_id: Uuid,
        filter: &RunFilter,
        page: &Page,
    ) -> impl Future<Output = Result<(Vec<FetchRun>, i64), FetchError>> + Send;

    fn health_check(&self) -> impl Future<Output = Result<(), FetchError>> + Send;
}

/// Persistence for scraped job postings.
///
/// The upsert contract is the dedup guarantee: implementations must merge
/// atomically on (owner_id, portal, external_job_id) so that interleaved
/// writes from concurrent runs never create duplicate rows, and must leave
/// `status` and `created_at` untouched on update.
pub trait JobStore: Send + Sync + Clone {
    /// Insert or update one posting. Returns the stored record and whether a
    /// new row was created.
    fn upsert_job(
        &self,
        record: &JobRecord,
    ) -> impl Future<Output = Result<(FetchedJob, bool), FetchError>> + Send;

    fn get_job(
        &self,
        owner_id: Uuid,
        job_id: Uuid,
    ) -> impl Future<Output = Result<Option<FetchedJob>, FetchError>> + Send;

    /// List jobs for an owner with the total count matching the filter.
    fn list_jobs(
        &self,
        owner_id: Uuid,
        filter: &JobFilter,
        page: &Page,
    ) -> impl Future<Output = Result<(Vec<FetchedJob>, i64), FetchError>> + Send;

    /// Set the review status. The caller-settable subset is enforced before
    /// this is reached. Returns None when the job does not exist for this
    /// owner.
    fn update_job_status(
        &self,
        owner_id: Uuid,
        job_id: Uuid,
        status: ReviewStatus,
    ) -> impl Future<Output = Result<Option<FetchedJob>, FetchError>> + Send;
}
