use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use uuid::Uuid;

use jobsift_core::orchestrator::{FetchOrchestrator, OrchestratorConfig};
use jobsift_core::testutil::{MockJobStore, MockProvider, MockRunStore};
use jobsift_server::auth::JwtService;
use jobsift_server::routes;
use jobsift_server::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-key";

/// Router plus handles on the in-memory backends, for assertions.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState<MockProvider, MockRunStore, MockJobStore>>,
    pub owner: Uuid,
    pub token: String,
}

/// Full application wired against mocks; millisecond poll timings so
/// background runs settle fast.
pub fn setup_test_app(provider: MockProvider) -> TestApp {
    let runs = MockRunStore::new();
    let jobs = MockJobStore::new();
    let jwt = JwtService::new(TEST_JWT_SECRET, "jobsift");

    let config = OrchestratorConfig::default()
        .with_poll_interval(Duration::from_millis(1))
        .with_max_wait(Duration::from_millis(50));
    let orchestrator = FetchOrchestrator::new(provider, runs.clone(), jobs.clone(), config);

    let owner = Uuid::new_v4();
    let token = jwt.create_token(owner).expect("token");

    let state = Arc::new(AppState {
        orchestrator,
        runs,
        jobs,
        jwt,
    });

    TestApp {
        router: routes::router(state.clone()),
        state,
        owner,
        token,
    }
}
