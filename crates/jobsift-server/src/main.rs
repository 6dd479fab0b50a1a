use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobsift_core::orchestrator::{FetchOrchestrator, OrchestratorConfig};
use jobsift_db::{Database, DatabaseConfig};
use jobsift_provider::{ApifyClient, ProviderConfig};
use jobsift_server::auth::JwtService;
use jobsift_server::routes;
use jobsift_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobsift=info".parse()?))
        .with_target(false)
        .init();

    let jwt_secret =
        std::env::var("JOBSIFT_JWT_SECRET").context("JOBSIFT_JWT_SECRET must be set")?;
    let port = std::env::var("JOBSIFT_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let provider = ApifyClient::new(ProviderConfig::from_env()?)?;
    let runs = db.run_repo();
    let jobs = db.job_repo();
    let orchestrator = FetchOrchestrator::new(
        provider,
        runs.clone(),
        jobs.clone(),
        orchestrator_config_from_env()?,
    );

    let state = Arc::new(AppState {
        orchestrator,
        runs,
        jobs,
        jwt: JwtService::new(&jwt_secret, "jobsift"),
    });

    let app = routes::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight fetch runs finalize before the process exits.
    state.orchestrator.shutdown().await;

    Ok(())
}

/// Poll cadence and wall-clock budget, overridable from the environment.
fn orchestrator_config_from_env() -> anyhow::Result<OrchestratorConfig> {
    let mut config = OrchestratorConfig::default();
    if let Ok(secs) = std::env::var("JOBSIFT_POLL_INTERVAL_SECS") {
        let secs: u64 = secs
            .parse()
            .context("JOBSIFT_POLL_INTERVAL_SECS must be a positive integer")?;
        config = config.with_poll_interval(Duration::from_secs(secs));
    }
    if let Ok(secs) = std::env::var("JOBSIFT_MAX_WAIT_SECS") {
        let secs: u64 = secs
            .parse()
            .context("JOBSIFT_MAX_WAIT_SECS must be a positive integer")?;
        config = config.with_max_wait(Duration::from_secs(secs));
    }
    Ok(config)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
