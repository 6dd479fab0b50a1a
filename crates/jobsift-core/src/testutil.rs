//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::error::FetchError;
use crate::job::{FetchedJob, JobFilter, JobRecord, ReviewStatus};
use crate::provider::RemoteRunState;
use crate::run::{FetchParams, FetchRun, NewFetchRun, Page, RunCompletion, RunFilter, RunStatus};
use crate::traits::{JobStore, RunStore, ScrapeProvider};

/// Fixed owner id for tests that do not exercise multi-tenancy.
pub fn test_owner() -> Uuid {
    Uuid::from_u128(0x0a0a_0a0a_0a0a_0a0a_0a0a_0a0a_0a0a_0a0a)
}

/// A provider result item in the raw camelCase wire shape.
pub fn raw_item_value(title: &str, job_url: &str, company: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "jobUrl": job_url,
        "companyName": company,
        "location": "Remote",
        "salary": "$69,000.00/yr - $96,500.00/yr",
        "publishedAt": "2025-11-03",
    })
}

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// Mock scrape provider with scripted poll states and canned results.
#[derive(Clone)]
pub struct MockProvider {
    start_error: Arc<Mutex<Option<FetchError>>>,
    /// Each poll pops the first state; the final state repeats forever.
    poll_states: Arc<Mutex<Vec<RemoteRunState>>>,
    results: Arc<Mutex<Vec<serde_json::Value>>>,
    dataset_items: Arc<Mutex<Vec<serde_json::Value>>>,
    dataset_error: Arc<Mutex<Option<FetchError>>>,
    start_calls: Arc<Mutex<u32>>,
    poll_calls: Arc<Mutex<u32>>,
}

impl MockProvider {
    /// Provider whose run starts, immediately reports SUCCEEDED, and yields
    /// the given items.
    pub fn succeeding(results: Vec<serde_json::Value>) -> Self {
        Self {
            start_error: Arc::new(Mutex::new(None)),
            poll_states: Arc::new(Mutex::new(vec![RemoteRunState::Succeeded])),
            results: Arc::new(Mutex::new(results)),
            dataset_items: Arc::new(Mutex::new(Vec::new())),
            dataset_error: Arc::new(Mutex::new(None)),
            start_calls: Arc::new(Mutex::new(0)),
            poll_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_start_error(error: FetchError) -> Self {
        let provider = Self::succeeding(Vec::new());
        *provider.start_error.lock().unwrap() = Some(error);
        provider
    }

    pub fn with_dataset_error(error: FetchError) -> Self {
        let provider = Self::succeeding(Vec::new());
        *provider.dataset_error.lock().unwrap() = Some(error);
        provider
    }

    pub fn with_poll_states(self, states: Vec<RemoteRunState>) -> Self {
        *self.poll_states.lock().unwrap() = states;
        self
    }

    pub fn with_dataset_items(self, items: Vec<serde_json::Value>) -> Self {
        *self.dataset_items.lock().unwrap() = items;
        self
    }

    pub fn start_calls(&self) -> u32 {
        *self.start_calls.lock().unwrap()
    }

    pub fn poll_calls(&self) -> u32 {
        *self.poll_calls.lock().unwrap()
    }
}

impl ScrapeProvider for MockProvider {
    async fn start_run(&self, _params: &FetchParams) -> Result<String, FetchError> {
        *self.start_calls.lock().unwrap() += 1;
        if let Some(e) = self.start_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok("mock-remote-run".to_string())
    }

    async fn poll_status(&self, _remote_run_id: &str) -> Result<RemoteRunState, FetchError> {
        *self.poll_calls.lock().unwrap() += 1;
        let mut states = self.poll_states.lock().unwrap();
        if states.len() > 1 {
            Ok(states.remove(0))
        } else {
            Ok(states.first().copied().unwrap_or(RemoteRunState::Succeeded))
        }
    }

    async fn fetch_results(&self, _remote_run_id: &str) -> Result<Vec<serde_json::Value>, FetchError> {
        Ok(self.results.lock().unwrap().clone())
    }

    async fn fetch_dataset_items(
        &self,
        _dataset_id: &str,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        if let Some(e) = self.dataset_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.dataset_items.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// MockRunStore
// ---------------------------------------------------------------------------

/// In-memory run store recording creations and finalizations.
#[derive(Clone)]
pub struct MockRunStore {
    pub runs: Arc<Mutex<Vec<FetchRun>>>,
    pub finalized: Arc<Mutex<Vec<(Uuid, RunCompletion)>>>,
    create_error: Arc<Mutex<Option<FetchError>>>,
}

impl MockRunStore {
    pub fn new() -> Self {
        Self {
            runs: Arc::new(Mutex::new(Vec::new())),
            finalized: Arc::new(Mutex::new(Vec::new())),
            create_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_create_error(error: FetchError) -> Self {
        let store = Self::new();
        *store.create_error.lock().unwrap() = Some(error);
        store
    }
}

impl Default for MockRunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore for MockRunStore {
    async fn create_run(&self, new_run: NewFetchRun) -> Result<FetchRun, FetchError> {
        if let Some(e) = self.create_error.lock().unwrap().take() {
            return Err(e);
        }
        let run = FetchRun {
            id: Uuid::new_v4(),
            owner_id: new_run.owner_id,
            portal: new_run.portal,
            status: RunStatus::Running,
            params: new_run.params,
            started_at: Utc::now(),
            finished_at: None,
            jobs_found: 0,
            new_jobs_added: 0,
            error: None,
        };
        self.runs.lock().unwrap().push(run.clone());
        Ok(run)
    }

    async fn finalize_run(
        &self,
        run_id: Uuid,
        completion: &RunCompletion,
    ) -> Result<(), FetchError> {
        let mut runs = self.runs.lock().unwrap();
        if let Some(run) = runs.iter_mut().find(|r| r.id == run_id)
            && run.status == RunStatus::Running
        {
            run.status = completion.status;
            run.jobs_found = completion.jobs_found;
            run.new_jobs_added = completion.new_jobs_added;
            run.error = completion.error.clone();
            run.finished_at = Some(Utc::now());
            self.finalized
                .lock()
                .unwrap()
                .push((run_id, completion.clone()));
        }
        Ok(())
    }

    async fn get_run(&self, owner_id: Uuid, run_id: Uuid) -> Result<Option<FetchRun>, FetchError> {
        let runs = self.runs.lock().unwrap();
        Ok(runs
            .iter()
            .find(|r| r.id == run_id && r.owner_id == owner_id)
            .cloned())
    }

    async fn list_runs(
        &self,
        owner_id: Uuid,
        filter: &RunFilter,
        page: &Page,
    ) -> Result<(Vec<FetchRun>, i64), FetchError> {
        let runs = self.runs.lock().unwrap();
        let mut matched: Vec<FetchRun> = runs
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| filter.portal.is_none_or(|p| r.portal == p))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        let total = matched.len() as i64;
        let offset = page.offset() as usize;
        let items = matched
            .into_iter()
            .skip(offset)
            .take(page.page_size as usize)
            .collect();
        Ok((items, total))
    }

    async fn health_check(&self) -> Result<(), FetchError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockJobStore
// ---------------------------------------------------------------------------

/// In-memory job store implementing the (owner, portal, external id) merge.
#[derive(Clone)]
pub struct MockJobStore {
    pub jobs: Arc<Mutex<Vec<FetchedJob>>>,
    upsert_error: Arc<Mutex<Option<FetchError>>>,
    upserts: Arc<Mutex<u32>>,
}

impl MockJobStore {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(Vec::new())),
            upsert_error: Arc::new(Mutex::new(None)),
            upserts: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_upsert_error(error: FetchError) -> Self {
        let store = Self::new();
        *store.upsert_error.lock().unwrap() = Some(error);
        store
    }

    /// Pre-populate a record under the given identity key, so a later upsert
    /// with the same key merges instead of inserting.
    pub fn seed(&self, owner_id: Uuid, portal: crate::run::Portal, external_job_id: &str) {
        let now = Utc::now();
        self.jobs.lock().unwrap().push(FetchedJob {
            id: Uuid::new_v4(),
            owner_id,
            fetch_run_id: Uuid::new_v4(),
            portal,
            external_job_id: external_job_id.to_string(),
            title: "Seeded".to_string(),
            company: "Seeded Co".to_string(),
            company_id: None,
            company_url: None,
            location: None,
            salary_min: None,
            salary_max: None,
            salary_text: None,
            job_url: format!("https://example.com/{external_job_id}"),
            apply_url: None,
            apply_type: None,
            description: None,
            contract_type: None,
            experience_level: None,
            work_type: None,
            sector: None,
            benefits: None,
            applications_count: None,
            posted_at: None,
            posted_time_text: None,
            status: ReviewStatus::New,
            fetched_at: now,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn upsert_count(&self) -> u32 {
        *self.upserts.lock().unwrap()
    }

    pub fn record_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

impl Default for MockJobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_record(job: &mut FetchedJob, record: &JobRecord) {
    job.fetch_run_id = record.fetch_run_id;
    job.title = record.title.clone();
    job.company = record.company.clone();
    job.company_id = record.company_id.clone();
    job.company_url = record.company_url.clone();
    job.location = record.location.clone();
    job.salary_min = record.salary_min;
    job.salary_max = record.salary_max;
    job.salary_text = record.salary_text.clone();
    job.job_url = record.job_url.clone();
    job.apply_url = record.apply_url.clone();
    job.apply_type = record.apply_type.clone();
    job.description = record.description.clone();
    job.contract_type = record.contract_type.clone();
    job.experience_level = record.experience_level.clone();
    job.work_type = record.work_type.clone();
    job.sector = record.sector.clone();
    job.benefits = record.benefits.clone();
    job.applications_count = record.applications_count.clone();
    job.posted_at = record.posted_at;
    job.posted_time_text = record.posted_time_text.clone();
    let now = Utc::now();
    job.fetched_at = now;
    job.updated_at = now;
}

impl JobStore for MockJobStore {
    async fn upsert_job(&self, record: &JobRecord) -> Result<(FetchedJob, bool), FetchError> {
        if let Some(e) = self.upsert_error.lock().unwrap().take() {
            return Err(e);
        }
        *self.upserts.lock().unwrap() += 1;

        let mut jobs = self.jobs.lock().unwrap();
        if let Some(existing) = jobs.iter_mut().find(|j| {
            j.owner_id == record.owner_id
                && j.portal == record.portal
                && j.external_job_id == record.external_job_id
        }) {
            // Merge: status and created_at stay as they are.
            apply_record(existing, record);
            return Ok((existing.clone(), false));
        }

        let now = Utc::now();
        let mut job = FetchedJob {
            id: Uuid::new_v4(),
            owner_id: record.owner_id,
            fetch_run_id: record.fetch_run_id,
            portal: record.portal,
            external_job_id: record.external_job_id.clone(),
            title: String::new(),
            company: String::new(),
            company_id: None,
            company_url: None,
            location: None,
            salary_min: None,
            salary_max: None,
            salary_text: None,
            job_url: String::new(),
            apply_url: None,
            apply_type: None,
            description: None,
            contract_type: None,
            experience_level: None,
            work_type: None,
            sector: None,
            benefits: None,
            applications_count: None,
            posted_at: None,
            posted_time_text: None,
            status: ReviewStatus::New,
            fetched_at: now,
            created_at: now,
            updated_at: now,
        };
        apply_record(&mut job, record);
        jobs.push(job.clone());
        Ok((job, true))
    }

    async fn get_job(&self, owner_id: Uuid, job_id: Uuid) -> Result<Option<FetchedJob>, FetchError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs
            .iter()
            .find(|j| j.id == job_id && j.owner_id == owner_id)
            .cloned())
    }

    async fn list_jobs(
        &self,
        owner_id: Uuid,
        filter: &JobFilter,
        page: &Page,
    ) -> Result<(Vec<FetchedJob>, i64), FetchError> {
        let jobs = self.jobs.lock().unwrap();
        let mut matched: Vec<FetchedJob> = jobs
            .iter()
            .filter(|j| j.owner_id == owner_id)
            .filter(|j| {
                filter
                    .portals
                    .as_ref()
                    .is_none_or(|ps| ps.contains(&j.portal))
            })
            .filter(|j| {
                filter
                    .statuses
                    .as_ref()
                    .is_none_or(|ss| ss.contains(&j.status))
            })
            .filter(|j| {
                filter.location.as_ref().is_none_or(|loc| {
                    j.location
                        .as_deref()
                        .is_some_and(|l| l.to_lowercase().contains(&loc.to_lowercase()))
                })
            })
            .filter(|j| {
                filter
                    .min_salary
                    .is_none_or(|min| j.salary_min.is_some_and(|s| s >= min))
            })
            .filter(|j| {
                filter
                    .company
                    .as_ref()
                    .is_none_or(|c| j.company.to_lowercase().contains(&c.to_lowercase()))
            })
            .filter(|j| {
                filter.query.as_ref().is_none_or(|q| {
                    let q = q.to_lowercase();
                    j.title.to_lowercase().contains(&q) || j.company.to_lowercase().contains(&q)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            let ord = match filter.sort {
                crate::job::JobSort::FetchedAt => a.fetched_at.cmp(&b.fetched_at),
                crate::job::JobSort::PostedAt => a.posted_at.cmp(&b.posted_at),
                crate::job::JobSort::Title => a.title.cmp(&b.title),
                crate::job::JobSort::Company => a.company.cmp(&b.company),
                crate::job::JobSort::SalaryMin => a
                    .salary_min
                    .partial_cmp(&b.salary_min)
                    .unwrap_or(std::cmp::Ordering::Equal),
            };
            if filter.sort_desc { ord.reverse() } else { ord }
        });
        let total = matched.len() as i64;
        let offset = page.offset() as usize;
        let items = matched
            .into_iter()
            .skip(offset)
            .take(page.page_size as usize)
            .collect();
        Ok((items, total))
    }

    async fn update_job_status(
        &self,
        owner_id: Uuid,
        job_id: Uuid,
        status: ReviewStatus,
    ) -> Result<Option<FetchedJob>, FetchError> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.owner_id == owner_id)
        {
            Some(job) => {
                job.status = status;
                job.updated_at = Utc::now();
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }
}
