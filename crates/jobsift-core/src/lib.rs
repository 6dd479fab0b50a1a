pub mod error;
pub mod job;
pub mod normalize;
pub mod orchestrator;
pub mod provider;
pub mod run;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use error::FetchError;
pub use job::{FetchedJob, JobFilter, JobRecord, JobSort, ReviewStatus};
pub use orchestrator::{FetchOrchestrator, OrchestratorConfig};
pub use provider::{RawJobItem, RemoteRunState};
pub use run::{
    FetchParams, FetchRun, NewFetchRun, Page, Portal, RunCompletion, RunFilter, RunStatus,
    RunSummary,
};
pub use traits::{JobStore, RunStore, ScrapeProvider};
