use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use jobsift_core::error::FetchError;
use jobsift_core::run::{
    FetchRun, NewFetchRun, Page, Portal, RunCompletion, RunFilter, RunStatus,
};
use jobsift_core::traits::RunStore;

/// PostgreSQL-backed store for fetch-run records.
#[derive(Clone)]
pub struct FetchRunRepository {
    pool: Pool<Postgres>,
}

impl FetchRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct FetchRunRow {
    id: Uuid,
    owner_id: Uuid,
    portal: String,
    status: String,
    input_params: serde_json::Value,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    jobs_found: i32,
    new_jobs_added: i32,
    errors: Option<serde_json::Value>,
}

impl From<FetchRunRow> for FetchRun {
    fn from(row: FetchRunRow) -> Self {
        FetchRun {
            id: row.id,
            owner_id: row.owner_id,
            // Both columns are CHECK-constrained to the parseable set.
            portal: row.portal.parse().unwrap_or(Portal::Linkedin),
            status: row.status.parse().unwrap_or(RunStatus::Running),
            params: row.input_params,
            started_at: row.started_at,
            finished_at: row.finished_at,
            jobs_found: row.jobs_found,
            new_jobs_added: row.new_jobs_added,
            error: row.errors,
        }
    }
}

impl RunStore for FetchRunRepository {
    async fn create_run(&self, new_run: NewFetchRun) -> Result<FetchRun, FetchError> {
        let row = sqlx::query_as::<_, FetchRunRow>(
            r#"
            INSERT INTO job_fetch_runs (owner_id, portal, input_params)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(new_run.owner_id)
        .bind(new_run.portal.as_str())
        .bind(&new_run.params)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

        Ok(row.into())
    }

    async fn finalize_run(
        &self,
        run_id: Uuid,
        completion: &RunCompletion,
    ) -> Result<(), FetchError> {
        // The status guard makes finalization idempotent: a run already in a
        // terminal state is left untouched.
        let result = sqlx::query(
            r#"
            UPDATE job_fetch_runs
            SET status = $2, jobs_found = $3, new_jobs_added = $4,
                errors = $5, finished_at = NOW()
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(run_id)
        .bind(completion.status.as_str())
        .bind(completion.jobs_found)
        .bind(completion.new_jobs_added)
        .bind(&completion.error)
        .execute(&self.pool)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            tracing::warn!(run_id = %run_id, "Finalization skipped: run missing or already terminal");
        }
        Ok(())
    }

    async fn get_run(&self, owner_id: Uuid, run_id: Uuid) -> Result<Option<FetchRun>, FetchError> {
        let row = sqlx::query_as::<_, FetchRunRow>(
            r#"
            SELECT * FROM job_fetch_runs
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(run_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn list_runs(
        &self,
        owner_id: Uuid,
        filter: &RunFilter,
        page: &Page,
    ) -> Result<(Vec<FetchRun>, i64), FetchError> {
        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM job_fetch_runs WHERE owner_id = ");
        count_query.push_bind(owner_id);
        push_run_filters(&mut count_query, filter);

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FetchError::Database(e.to_string()))?;

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM job_fetch_runs WHERE owner_id = ");
        query.push_bind(owner_id);
        push_run_filters(&mut query, filter);
        query.push(" ORDER BY started_at DESC LIMIT ");
        query.push_bind(i64::from(page.page_size));
        query.push(" OFFSET ");
        query.push_bind(page.offset());

        let rows = query
            .build_query_as::<FetchRunRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| FetchError::Database(e.to_string()))?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn health_check(&self) -> Result<(), FetchError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| FetchError::Database(e.to_string()))?;
        Ok(())
    }
}

fn push_run_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &RunFilter) {
    if let Some(portal) = filter.portal {
        query.push(" AND portal = ");
        query.push_bind(portal.as_str());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
}
