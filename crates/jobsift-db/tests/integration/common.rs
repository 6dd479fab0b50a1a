use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

/// SQL migration statements, executed one at a time.
const MIGRATIONS: &[&str] = &[
    // 0001_create_job_fetch_runs.sql
    r#"CREATE TABLE IF NOT EXISTS job_fetch_runs (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        owner_id UUID NOT NULL,
        portal TEXT NOT NULL CHECK (portal IN ('linkedin', 'naukri', 'indeed')),
        status TEXT NOT NULL DEFAULT 'running'
            CHECK (status IN ('running', 'completed', 'failed')),
        input_params JSONB NOT NULL DEFAULT '{}'::jsonb,
        started_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        finished_at TIMESTAMPTZ,
        jobs_found INTEGER NOT NULL DEFAULT 0,
        new_jobs_added INTEGER NOT NULL DEFAULT 0,
        errors JSONB
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_job_fetch_runs_owner_started
        ON job_fetch_runs (owner_id, started_at DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_job_fetch_runs_status
        ON job_fetch_runs (status)"#,
    // 0002_create_fetched_jobs.sql
    r#"CREATE TABLE IF NOT EXISTS fetched_jobs (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        owner_id UUID NOT NULL,
        fetch_run_id UUID NOT NULL REFERENCES job_fetch_runs (id),
        portal TEXT NOT NULL CHECK (portal IN ('linkedin', 'naukri', 'indeed')),
        external_job_id TEXT NOT NULL,
        title TEXT NOT NULL,
        company TEXT NOT NULL,
        company_id TEXT,
        company_url TEXT,
        location TEXT,
        salary_min DOUBLE PRECISION,
        salary_max DOUBLE PRECISION,
        salary_text TEXT,
        job_url TEXT NOT NULL,
        apply_url TEXT,
        apply_type TEXT,
        description TEXT,
        contract_type TEXT,
        experience_level TEXT,
        work_type TEXT,
        sector TEXT,
        benefits TEXT,
        applications_count TEXT,
        posted_at DATE,
        posted_time_text TEXT,
        status TEXT NOT NULL DEFAULT 'new'
            CHECK (status IN ('new', 'reviewed', 'queued', 'applied', 'skipped', 'expired')),
        fetched_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT uq_fetched_jobs_identity UNIQUE (owner_id, portal, external_job_id)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_fetched_jobs_owner_fetched
        ON fetched_jobs (owner_id, fetched_at DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_fetched_jobs_owner_status
        ON fetched_jobs (owner_id, status)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_fetched_jobs_run
        ON fetched_jobs (fetch_run_id)"#,
];

/// Spins up a PostgreSQL container and returns a connected pool.
///
/// The `ContainerAsync` must be kept in scope for the test duration;
/// dropping it will stop the container.
pub async fn setup_test_db() -> (PgPool, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "jobsift_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let connection_string = format!("postgresql://postgres:postgres@{host}:{port}/jobsift_test");

    // Retry connection until container is fully ready
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!("Failed to connect to database after {MAX_RETRIES} retries: {e}");
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    };

    // Run migrations one statement at a time
    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(&pool)
            .await
            .expect("Failed to run migration");
    }

    (pool, container)
}
