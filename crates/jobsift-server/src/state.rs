use jobsift_core::orchestrator::FetchOrchestrator;
use jobsift_core::traits::{JobStore, RunStore, ScrapeProvider};

use crate::auth::JwtService;

/// Shared application state, available to all route handlers via
/// `State<Arc<AppState<..>>>`. Generic over the provider and stores so tests
/// can run the full router against in-memory implementations.
pub struct AppState<P, R, J>
where
    P: ScrapeProvider + 'static,
    R: RunStore + 'static,
    J: JobStore + 'static,
{
    pub orchestrator: FetchOrchestrator<P, R, J>,
    pub runs: R,
    pub jobs: J,
    pub jwt: JwtService,
}
