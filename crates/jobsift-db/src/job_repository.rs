use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use jobsift_core::error::FetchError;
use jobsift_core::job::{FetchedJob, JobFilter, JobRecord, ReviewStatus};
use jobsift_core::run::{Page, Portal};
use jobsift_core::traits::JobStore;

/// PostgreSQL-backed store for deduplicated job postings.
#[derive(Clone)]
pub struct FetchedJobRepository {
    pool: Pool<Postgres>,
}

impl FetchedJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct FetchedJobRow {
    id: Uuid,
    owner_id: Uuid,
    fetch_run_id: Uuid,
    portal: String,
    external_job_id: String,
    title: String,
    company: String,
    company_id: Option<String>,
    company_url: Option<String>,
    location: Option<String>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    salary_text: Option<String>,
    job_url: String,
    apply_url: Option<String>,
    apply_type: Option<String>,
    description: Option<String>,
    contract_type: Option<String>,
    experience_level: Option<String>,
    work_type: Option<String>,
    sector: Option<String>,
    benefits: Option<String>,
    applications_count: Option<String>,
    posted_at: Option<NaiveDate>,
    posted_time_text: Option<String>,
    status: String,
    fetched_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Only present on the upsert query; `xmax = 0` marks a fresh insert.
    #[sqlx(default)]
    was_created: bool,
}

impl From<FetchedJobRow> for FetchedJob {
    fn from(row: FetchedJobRow) -> Self {
        FetchedJob {
            id: row.id,
            owner_id: row.owner_id,
            fetch_run_id: row.fetch_run_id,
            // Both columns are CHECK-constrained to the parseable set.
            portal: row.portal.parse().unwrap_or(Portal::Linkedin),
            external_job_id: row.external_job_id,
            title: row.title,
            company: row.company,
            company_id: row.company_id,
            company_url: row.company_url,
            location: row.location,
            salary_min: row.salary_min,
            salary_max: row.salary_max,
            salary_text: row.salary_text,
            job_url: row.job_url,
            apply_url: row.apply_url,
            apply_type: row.apply_type,
            description: row.description,
            contract_type: row.contract_type,
            experience_level: row.experience_level,
            work_type: row.work_type,
            sector: row.sector,
            benefits: row.benefits,
            applications_count: row.applications_count,
            posted_at: row.posted_at,
            posted_time_text: row.posted_time_text,
            status: row.status.parse().unwrap_or(ReviewStatus::New),
            fetched_at: row.fetched_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl JobStore for FetchedJobRepository {
    async fn upsert_job(&self, record: &JobRecord) -> Result<(FetchedJob, bool), FetchError> {
        // Single-statement merge on the identity key. The update list leaves
        // status and created_at alone; `xmax = 0` distinguishes a fresh
        // insert from a conflict update.
        let row = sqlx::query_as::<_, FetchedJobRow>(
            r#"
            INSERT INTO fetched_jobs (
                owner_id, fetch_run_id, portal, external_job_id,
                title, company, company_id, company_url, location,
                salary_min, salary_max, salary_text,
                job_url, apply_url, apply_type, description,
                contract_type, experience_level, work_type, sector,
                benefits, applications_count, posted_at, posted_time_text
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            ON CONFLICT (owner_id, portal, external_job_id) DO UPDATE SET
                fetch_run_id = EXCLUDED.fetch_run_id,
                title = EXCLUDED.title,
                company = EXCLUDED.company,
                company_id = EXCLUDED.company_id,
                company_url = EXCLUDED.company_url,
                location = EXCLUDED.location,
                salary_min = EXCLUDED.salary_min,
                salary_max = EXCLUDED.salary_max,
                salary_text = EXCLUDED.salary_text,
                job_url = EXCLUDED.job_url,
                apply_url = EXCLUDED.apply_url,
                apply_type = EXCLUDED.apply_type,
                description = EXCLUDED.description,
                contract_type = EXCLUDED.contract_type,
                experience_level = EXCLUDED.experience_level,
                work_type = EXCLUDED.work_type,
                sector = EXCLUDED.sector,
                benefits = EXCLUDED.benefits,
                applications_count = EXCLUDED.applications_count,
                posted_at = EXCLUDED.posted_at,
                posted_time_text = EXCLUDED.posted_time_text,
                fetched_at = NOW(),
                updated_at = NOW()
            RETURNING *, (xmax = 0) AS was_created
            "#,
        )
        .bind(record.owner_id)
        .bind(record.fetch_run_id)
        .bind(record.portal.as_str())
        .bind(&record.external_job_id)
        .bind(&record.title)
        .bind(&record.company)
        .bind(&record.company_id)
        .bind(&record.company_url)
        .bind(&record.location)
        .bind(record.salary_min)
        .bind(record.salary_max)
        .bind(&record.salary_text)
        .bind(&record.job_url)
        .bind(&record.apply_url)
        .bind(&record.apply_type)
        .bind(&record.description)
        .bind(&record.contract_type)
        .bind(&record.experience_level)
        .bind(&record.work_type)
        .bind(&record.sector)
        .bind(&record.benefits)
        .bind(&record.applications_count)
        .bind(record.posted_at)
        .bind(&record.posted_time_text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

        let was_created = row.was_created;
        Ok((row.into(), was_created))
    }

    async fn get_job(&self, owner_id: Uuid, job_id: Uuid) -> Result<Option<FetchedJob>, FetchError> {
        let row = sqlx::query_as::<_, FetchedJobRow>(
            r#"
            SELECT * FROM fetched_jobs
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(job_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn list_jobs(
        &self,
        owner_id: Uuid,
        filter: &JobFilter,
        page: &Page,
    ) -> Result<(Vec<FetchedJob>, i64), FetchError> {
        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM fetched_jobs WHERE owner_id = ");
        count_query.push_bind(owner_id);
        push_job_filters(&mut count_query, filter);

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FetchError::Database(e.to_string()))?;

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM fetched_jobs WHERE owner_id = ");
        query.push_bind(owner_id);
        push_job_filters(&mut query, filter);

        // Sort column comes from the JobSort whitelist, never from raw input.
        query.push(format!(
            " ORDER BY {} {}",
            filter.sort.column(),
            if filter.sort_desc { "DESC" } else { "ASC" }
        ));
        query.push(" LIMIT ");
        query.push_bind(i64::from(page.page_size));
        query.push(" OFFSET ");
        query.push_bind(page.offset());

        let rows = query
            .build_query_as::<FetchedJobRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| FetchError::Database(e.to_string()))?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn update_job_status(
        &self,
        owner_id: Uuid,
        job_id: Uuid,
        status: ReviewStatus,
    ) -> Result<Option<FetchedJob>, FetchError> {
        let row = sqlx::query_as::<_, FetchedJobRow>(
            r#"
            UPDATE fetched_jobs
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(owner_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

        Ok(row.map(Into::into))
    }
}

fn push_job_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
    if let Some(portals) = &filter.portals {
        let portals: Vec<String> = portals.iter().map(|p| p.as_str().to_string()).collect();
        query.push(" AND portal = ANY(");
        query.push_bind(portals);
        query.push(")");
    }
    if let Some(statuses) = &filter.statuses {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        query.push(" AND status = ANY(");
        query.push_bind(statuses);
        query.push(")");
    }
    if let Some(location) = &filter.location {
        query.push(" AND location ILIKE ");
        query.push_bind(format!("%{location}%"));
    }
    if let Some(min_salary) = filter.min_salary {
        query.push(" AND salary_min >= ");
        query.push_bind(min_salary);
    }
    if let Some(company) = &filter.company {
        query.push(" AND company ILIKE ");
        query.push_bind(format!("%{company}%"));
    }
    if let Some(q) = &filter.query {
        let pattern = format!("%{q}%");
        query.push(" AND (title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR company ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}
