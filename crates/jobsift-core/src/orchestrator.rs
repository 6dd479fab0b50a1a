use std::time::Duration;

use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::error::FetchError;
use crate::job::JobRecord;
use crate::provider::{RawJobItem, RemoteRunState};
use crate::run::{FetchParams, FetchRun, NewFetchRun, Portal, RunCompletion, RunSummary};
use crate::traits::{JobStore, RunStore, ScrapeProvider};

/// Timing configuration for the remote completion protocol.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Fixed delay between status polls.
    pub poll_interval: Duration,
    /// Overall wall-clock budget for the poll loop. Exhausting it fails the
    /// run with ProviderTimeout rather than blocking indefinitely.
    pub max_wait: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// Counts accumulated while ingesting one run's result items.
#[derive(Debug, Clone, Copy, Default)]
struct IngestTally {
    jobs_found: i32,
    new_jobs_added: i32,
    items_skipped: i32,
}

/// The fetch-run state machine.
///
/// Creates a run, launches the remote scrape, drives it to completion or
/// failure, deduplicates and stores results, and finalizes the run record.
/// Generic over all external dependencies via traits; everything is injected
/// at construction time.
pub struct FetchOrchestrator<P, R, J>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    provider: P,
    runs: R,
    jobs: J,
    config: OrchestratorConfig,
    tracker: TaskTracker,
}

impl<P, R, J> FetchOrchestrator<P, R, J>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    pub fn new(provider: P, runs: R, jobs: J, config: OrchestratorConfig) -> Self {
        Self {
            provider,
            runs,
            jobs,
            config,
            tracker: TaskTracker::new(),
        }
    }

    /// Start a fetch run.
    ///
    /// Synchronous only through run creation: the created run (state Running)
    /// is returned immediately and the rest of the pipeline executes as a
    /// supervised background task. The only failures visible here are
    /// `Validation` and `RunCreation`; nothing is scheduled when they occur.
    pub async fn start(
        &self,
        owner_id: Uuid,
        portal: Portal,
        params: FetchParams,
    ) -> Result<FetchRun, FetchError> {
        params.validate()?;

        let run = self.create_run(owner_id, portal, serde_json::to_value(&params)?).await?;

        let provider = self.provider.clone();
        let runs = self.runs.clone();
        let jobs = self.jobs.clone();
        let config = self.config;
        let run_id = run.id;
        self.tracker.spawn(async move {
            let outcome =
                run_scrape_pipeline(&provider, &jobs, config, run_id, owner_id, portal, &params)
                    .await;
            finalize(&runs, run_id, outcome).await;
        });

        Ok(run)
    }

    /// Run the full pipeline inline and wait for the outcome.
    ///
    /// Same state machine as [`start`](Self::start), without the background
    /// handoff. Used by the CLI, where the caller wants the counts.
    pub async fn run_to_finish(
        &self,
        owner_id: Uuid,
        portal: Portal,
        params: FetchParams,
    ) -> Result<RunSummary, FetchError> {
        params.validate()?;

        let run = self.create_run(owner_id, portal, serde_json::to_value(&params)?).await?;
        let outcome = run_scrape_pipeline(
            &self.provider,
            &self.jobs,
            self.config,
            run.id,
            owner_id,
            portal,
            &params,
        )
        .await;

        self.finalize_and_summarize(run.id, outcome).await
    }

    /// Ingest an existing provider result set, skipping the remote scrape.
    ///
    /// Creates a run whose params record the dataset source, then applies the
    /// same dedup/store/finalize steps as a live fetch. Runs inline; ingest
    /// errors finalize the run as Failed and surface to the caller.
    pub async fn start_from_dataset(
        &self,
        owner_id: Uuid,
        portal: Portal,
        dataset_id: &str,
    ) -> Result<RunSummary, FetchError> {
        if dataset_id.trim().is_empty() {
            return Err(FetchError::Validation("dataset_id must not be empty".into()));
        }

        let params = serde_json::json!({
            "dataset_id": dataset_id,
            "source": "existing_dataset",
        });
        let run = self.create_run(owner_id, portal, params).await?;

        let outcome = match self.provider.fetch_dataset_items(dataset_id).await {
            Ok(items) => {
                ingest_items(&self.jobs, run.id, owner_id, portal, items).await
            }
            Err(e) => Err(e),
        };

        self.finalize_and_summarize(run.id, outcome).await
    }

    /// Close the tracker and wait for in-flight runs to finalize.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    async fn create_run(
        &self,
        owner_id: Uuid,
        portal: Portal,
        params: serde_json::Value,
    ) -> Result<FetchRun, FetchError> {
        let run = self
            .runs
            .create_run(NewFetchRun {
                owner_id,
                portal,
                params,
            })
            .await
            .map_err(|e| FetchError::RunCreation(e.to_string()))?;

        tracing::info!(run_id = %run.id, %portal, "Fetch run created");
        Ok(run)
    }

    async fn finalize_and_summarize(
        &self,
        run_id: Uuid,
        outcome: Result<IngestTally, FetchError>,
    ) -> Result<RunSummary, FetchError> {
        match outcome {
            Ok(tally) => {
                let completion =
                    RunCompletion::completed(tally.jobs_found, tally.new_jobs_added);
                self.runs.finalize_run(run_id, &completion).await?;
                Ok(RunSummary {
                    run_id,
                    status: completion.status,
                    jobs_found: completion.jobs_found,
                    new_jobs_added: completion.new_jobs_added,
                })
            }
            Err(e) => {
                tracing::warn!(run_id = %run_id, error = %e, "Fetch run failed");
                let completion = RunCompletion::failed(e.error_payload());
                if let Err(store_err) = self.runs.finalize_run(run_id, &completion).await {
                    tracing::error!(
                        run_id = %run_id,
                        error = %store_err,
                        "Failed to finalize failed run"
                    );
                }
                Err(e)
            }
        }
    }
}

/// Background phase of a live fetch: remote start → poll to completion →
/// retrieve → per-item upsert. Errors are returned to the caller for capture
/// on the run record, never thrown past the orchestrator boundary.
async fn run_scrape_pipeline<P, J>(
    provider: &P,
    jobs: &J,
    config: OrchestratorConfig,
    run_id: Uuid,
    owner_id: Uuid,
    portal: Portal,
    params: &FetchParams,
) -> Result<IngestTally, FetchError>
where
    P: ScrapeProvider,
    J: JobStore,
{
    let remote_run_id = provider.start_run(params).await?;
    tracing::info!(run_id = %run_id, %remote_run_id, "Remote scrape started");

    await_remote_completion(provider, &remote_run_id, config).await?;

    let items = provider.fetch_results(&remote_run_id).await?;
    tracing::info!(run_id = %run_id, items = items.len(), "Remote results retrieved");

    ingest_items(jobs, run_id, owner_id, portal, items).await
}

/// Completion protocol: poll with a fixed delay until the remote run reaches
/// a terminal state or the wall-clock budget runs out.
///
/// Budget exhaustion is `ProviderTimeout`, a distinct failure from the
/// provider itself reporting TIMED-OUT (which is `ProviderRunFailed`).
async fn await_remote_completion<P>(
    provider: &P,
    remote_run_id: &str,
    config: OrchestratorConfig,
) -> Result<(), FetchError>
where
    P: ScrapeProvider,
{
    let started = tokio::time::Instant::now();
    loop {
        let state = provider.poll_status(remote_run_id).await?;
        if state.is_terminal() {
            return match state {
                RemoteRunState::Succeeded => Ok(()),
                other => Err(FetchError::ProviderRunFailed { state: other }),
            };
        }

        if started.elapsed() >= config.max_wait {
            return Err(FetchError::ProviderTimeout {
                waited_secs: config.max_wait.as_secs(),
            });
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}

/// Normalize, deduplicate, and store one run's raw items.
///
/// Items failing schema validation are skipped and counted, never fatal.
/// `jobs_found` counts successfully parsed items; `new_jobs_added` counts
/// upserts that created a new record.
async fn ingest_items<J>(
    jobs: &J,
    run_id: Uuid,
    owner_id: Uuid,
    portal: Portal,
    items: Vec<serde_json::Value>,
) -> Result<IngestTally, FetchError>
where
    J: JobStore,
{
    let mut tally = IngestTally::default();

    for item in &items {
        let raw = match RawJobItem::parse(item) {
            Ok(raw) => raw,
            Err(e) => {
                tally.items_skipped += 1;
                tracing::warn!(run_id = %run_id, error = %e, "Skipping malformed result item");
                continue;
            }
        };

        let record = JobRecord::from_raw(owner_id, run_id, portal, &raw);
        let (_, created) = jobs.upsert_job(&record).await?;
        tally.jobs_found += 1;
        if created {
            tally.new_jobs_added += 1;
        }
    }

    tracing::info!(
        run_id = %run_id,
        jobs_found = tally.jobs_found,
        new_jobs_added = tally.new_jobs_added,
        items_skipped = tally.items_skipped,
        "Ingestion complete"
    );
    Ok(tally)
}

async fn finalize<R: RunStore>(runs: &R, run_id: Uuid, outcome: Result<IngestTally, FetchError>) {
    let completion = match outcome {
        Ok(tally) => {
            RunCompletion::completed(tally.jobs_found, tally.new_jobs_added)
        }
        Err(e) => {
            tracing::warn!(run_id = %run_id, error = %e, "Fetch run failed");
            RunCompletion::failed(e.error_payload())
        }
    };

    if let Err(e) = runs.finalize_run(run_id, &completion).await {
        // The run stays RUNNING in the store; it will read as orphaned.
        tracing::error!(run_id = %run_id, error = %e, "Failed to finalize run");
    } else {
        tracing::info!(run_id = %run_id, status = %completion.status, "Fetch run finalized");
    }
}
