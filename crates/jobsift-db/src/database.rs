use jobsift_core::FetchError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::job_repository::FetchedJobRepository;
use crate::run_repository::FetchRunRepository;

/// Central database facade. Owns the connection pool, runs migrations,
/// and vends repository instances.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL with the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, FetchError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| FetchError::Database(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), FetchError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| FetchError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get a [`FetchRunRepository`] backed by this pool.
    pub fn run_repo(&self) -> FetchRunRepository {
        FetchRunRepository::new(self.pool.clone())
    }

    /// Get a [`FetchedJobRepository`] backed by this pool.
    pub fn job_repo(&self) -> FetchedJobRepository {
        FetchedJobRepository::new(self.pool.clone())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
