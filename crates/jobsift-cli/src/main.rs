use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use jobsift_core::job::{JobFilter, ReviewStatus};
use jobsift_core::run::{FetchParams, Page, Portal, RunFilter, RunStatus};
use jobsift_core::traits::{JobStore, RunStore};
use jobsift_core::{FetchOrchestrator, OrchestratorConfig};
use jobsift_db::{Database, DatabaseConfig};
use jobsift_provider::{ApifyClient, ProviderConfig};

#[derive(Parser)]
#[command(name = "jobsift", version, about = "Job posting fetch and dedup pipeline")]
struct Cli {
    /// Owner the command acts for. Stands in for the verified caller
    /// identity the HTTP API derives from its bearer token.
    #[arg(long, env = "JOBSIFT_OWNER_ID", global = true)]
    owner: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scrape against the provider and wait for it to finish
    Fetch {
        /// Portal to attribute the postings to
        #[arg(short, long, default_value = "linkedin")]
        portal: String,

        /// Job title to search for
        #[arg(short, long)]
        title: Option<String>,

        /// Location filter
        #[arg(short, long)]
        location: Option<String>,

        /// Company names to restrict the search to (repeatable)
        #[arg(long)]
        company: Vec<String>,

        /// Posting-date filter, passed to the provider unchanged
        #[arg(long)]
        published_at: Option<String>,

        /// Number of postings to request (1-100)
        #[arg(short, long, default_value_t = 50)]
        rows: u32,
    },

    /// Re-ingest an already-collected provider dataset without scraping
    Replay {
        /// Provider dataset id holding the items
        #[arg(short, long)]
        dataset_id: String,

        /// Portal to attribute the postings to
        #[arg(short, long, default_value = "linkedin")]
        portal: String,
    },

    /// List recent fetch runs
    Runs {
        /// Filter by portal
        #[arg(short, long)]
        portal: Option<String>,

        /// Filter by run status (running, completed, failed)
        #[arg(short, long)]
        status: Option<String>,

        /// Number of runs to show
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// List stored job postings
    Jobs {
        /// Filter by review status (repeatable)
        #[arg(short, long)]
        status: Vec<String>,

        /// Free-text search over title and company
        #[arg(short, long)]
        query: Option<String>,

        /// Location substring filter
        #[arg(short, long)]
        location: Option<String>,

        /// Minimum salary floor
        #[arg(long)]
        min_salary: Option<f64>,

        /// Number of jobs to show
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Set the review status of a stored job
    SetStatus {
        /// Job id
        #[arg(short, long)]
        job: Uuid,

        /// New status (reviewed, queued, skipped)
        #[arg(short, long)]
        status: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobsift=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let owner = cli
        .owner
        .context("--owner (or JOBSIFT_OWNER_ID) is required")?;

    let db = connect_db().await?;

    match cli.command {
        Commands::Fetch {
            portal,
            title,
            location,
            company,
            published_at,
            rows,
        } => {
            let params = FetchParams {
                title,
                location,
                company_names: if company.is_empty() {
                    None
                } else {
                    Some(company)
                },
                company_ids: None,
                published_at,
                rows,
            };
            cmd_fetch(owner, parse_portal(&portal)?, params, &db).await?;
        }
        Commands::Replay { dataset_id, portal } => {
            cmd_replay(owner, parse_portal(&portal)?, &dataset_id, &db).await?;
        }
        Commands::Runs {
            portal,
            status,
            limit,
        } => {
            let filter = RunFilter {
                portal: portal.as_deref().map(parse_portal).transpose()?,
                status: status
                    .as_deref()
                    .map(|s| s.parse::<RunStatus>().map_err(anyhow::Error::msg))
                    .transpose()?,
            };
            cmd_runs(owner, &filter, limit, &db).await?;
        }
        Commands::Jobs {
            status,
            query,
            location,
            min_salary,
            limit,
        } => {
            let statuses = status
                .iter()
                .map(|s| s.parse::<ReviewStatus>().map_err(anyhow::Error::msg))
                .collect::<Result<Vec<_>>>()?;
            let filter = JobFilter {
                statuses: if statuses.is_empty() {
                    None
                } else {
                    Some(statuses)
                },
                query,
                location,
                min_salary,
                ..Default::default()
            };
            cmd_jobs(owner, &filter, limit, &db).await?;
        }
        Commands::SetStatus { job, status } => {
            cmd_set_status(owner, job, &status, &db).await?;
        }
    }

    Ok(())
}

/// Connect to PostgreSQL using DATABASE_URL and apply migrations.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.map_err(|e| anyhow::anyhow!(e))?;
    Ok(db)
}

fn parse_portal(value: &str) -> Result<Portal> {
    value.parse::<Portal>().map_err(anyhow::Error::msg)
}

fn orchestrator(
    db: &Database,
) -> Result<
    FetchOrchestrator<
        ApifyClient,
        jobsift_db::FetchRunRepository,
        jobsift_db::FetchedJobRepository,
    >,
> {
    let provider_config = ProviderConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let provider = ApifyClient::new(provider_config).map_err(|e| anyhow::anyhow!(e))?;
    Ok(FetchOrchestrator::new(
        provider,
        db.run_repo(),
        db.job_repo(),
        OrchestratorConfig::default(),
    ))
}

async fn cmd_fetch(
    owner: Uuid,
    portal: Portal,
    params: FetchParams,
    db: &Database,
) -> Result<()> {
    let orchestrator = orchestrator(db)?;

    tracing::info!(%portal, rows = params.rows, "Starting fetch run");

    let summary = orchestrator
        .run_to_finish(owner, portal, params)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    println!(
        "Run {} {}: {} jobs found, {} new",
        summary.run_id, summary.status, summary.jobs_found, summary.new_jobs_added
    );

    Ok(())
}

async fn cmd_replay(owner: Uuid, portal: Portal, dataset_id: &str, db: &Database) -> Result<()> {
    let orchestrator = orchestrator(db)?;

    tracing::info!(dataset_id, "Replaying dataset");

    let summary = orchestrator
        .start_from_dataset(owner, portal, dataset_id)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    println!(
        "Run {} {}: {} jobs found, {} new",
        summary.run_id, summary.status, summary.jobs_found, summary.new_jobs_added
    );

    Ok(())
}

async fn cmd_runs(owner: Uuid, filter: &RunFilter, limit: u32, db: &Database) -> Result<()> {
    let page = Page {
        page: 1,
        page_size: limit,
    };
    let (runs, total) = db
        .run_repo()
        .list_runs(owner, filter, &page)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if runs.is_empty() {
        println!("No runs found");
        return Ok(());
    }

    for run in &runs {
        println!(
            "  [{}] {} {} started {} found={} new={}",
            run.status,
            run.id,
            run.portal,
            run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            run.jobs_found,
            run.new_jobs_added,
        );
        if let Some(error) = &run.error {
            println!("      error: {error}");
        }
    }

    println!("\nTotal: {total} runs");

    Ok(())
}

async fn cmd_jobs(owner: Uuid, filter: &JobFilter, limit: u32, db: &Database) -> Result<()> {
    let page = Page {
        page: 1,
        page_size: limit,
    };
    let (jobs, total) = db
        .job_repo()
        .list_jobs(owner, filter, &page)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if jobs.is_empty() {
        println!("No jobs found");
        return Ok(());
    }

    for job in &jobs {
        let location = job.location.as_deref().unwrap_or("?");
        println!(
            "  [{}] {} | {} @ {} ({})",
            job.status, job.id, job.title, job.company, location
        );
    }

    println!("\nTotal: {total} jobs");

    Ok(())
}

async fn cmd_set_status(owner: Uuid, job_id: Uuid, status: &str, db: &Database) -> Result<()> {
    let status: ReviewStatus = status.parse().map_err(anyhow::Error::msg)?;
    if !status.caller_settable() {
        anyhow::bail!("Status '{status}' cannot be set here; allowed: reviewed, queued, skipped");
    }

    let updated = db
        .job_repo()
        .update_job_status(owner, job_id, status)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match updated {
        Some(job) => println!("{} -> {}", job.id, job.status),
        None => anyhow::bail!("Job {job_id} not found"),
    }

    Ok(())
}
