use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize::{derive_external_id, parse_posted_date, parse_salary};
use crate::provider::RawJobItem;
use crate::run::Portal;

/// Review lifecycle of a stored job posting.
///
/// Owned by the caller/workflow layer: ingestion sets `New` on first sight and
/// never touches the status again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    New,
    Reviewed,
    Queued,
    Applied,
    Skipped,
    Expired,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::New => "new",
            ReviewStatus::Reviewed => "reviewed",
            ReviewStatus::Queued => "queued",
            ReviewStatus::Applied => "applied",
            ReviewStatus::Skipped => "skipped",
            ReviewStatus::Expired => "expired",
        }
    }

    /// The subset a caller may assign through the status endpoint.
    pub fn caller_settable(&self) -> bool {
        matches!(
            self,
            ReviewStatus::Reviewed | ReviewStatus::Queued | ReviewStatus::Skipped
        )
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(ReviewStatus::New),
            "reviewed" => Ok(ReviewStatus::Reviewed),
            "queued" => Ok(ReviewStatus::Queued),
            "applied" => Ok(ReviewStatus::Applied),
            "skipped" => Ok(ReviewStatus::Skipped),
            "expired" => Ok(ReviewStatus::Expired),
            _ => Err(format!("Unknown review status: {}", s)),
        }
    }
}

/// A stored job posting. Exactly one live record per
/// (owner_id, portal, external_job_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedJob {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// The fetch run that most recently touched this record.
    pub fetch_run_id: Uuid,
    pub portal: Portal,
    pub external_job_id: String,
    pub title: String,
    pub company: String,
    pub company_id: Option<String>,
    pub company_url: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    /// Raw provider salary text, preserved verbatim for audit.
    pub salary_text: Option<String>,
    pub job_url: String,
    pub apply_url: Option<String>,
    pub apply_type: Option<String>,
    pub description: Option<String>,
    pub contract_type: Option<String>,
    pub experience_level: Option<String>,
    pub work_type: Option<String>,
    pub sector: Option<String>,
    pub benefits: Option<String>,
    pub applications_count: Option<String>,
    pub posted_at: Option<NaiveDate>,
    /// Human-text posting age, the fallback when posted_at is unparseable.
    pub posted_time_text: Option<String>,
    pub status: ReviewStatus,
    pub fetched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scrape-derived upsert payload for one job posting.
///
/// Deliberately carries no review status or created timestamp: those columns
/// belong to the caller and must survive re-ingestion untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub owner_id: Uuid,
    pub fetch_run_id: Uuid,
    pub portal: Portal,
    pub external_job_id: String,
    pub title: String,
    pub company: String,
    pub company_id: Option<String>,
    pub company_url: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_text: Option<String>,
    pub job_url: String,
    pub apply_url: Option<String>,
    pub apply_type: Option<String>,
    pub description: Option<String>,
    pub contract_type: Option<String>,
    pub experience_level: Option<String>,
    pub work_type: Option<String>,
    pub sector: Option<String>,
    pub benefits: Option<String>,
    pub applications_count: Option<String>,
    pub posted_at: Option<NaiveDate>,
    pub posted_time_text: Option<String>,
}

impl JobRecord {
    /// Normalize a raw provider item into an upsert payload.
    pub fn from_raw(owner_id: Uuid, fetch_run_id: Uuid, portal: Portal, raw: &RawJobItem) -> Self {
        let external_job_id = derive_external_id(&raw.job_url);
        let (salary_min, salary_max) = parse_salary(raw.salary.as_deref());
        let posted_at = parse_posted_date(raw.published_at.as_deref());

        Self {
            owner_id,
            fetch_run_id,
            portal,
            external_job_id,
            title: raw.title.clone(),
            company: raw.company_name.clone(),
            company_id: raw.company_id.clone(),
            company_url: raw.company_url.clone(),
            location: raw.location.clone(),
            salary_min,
            salary_max,
            salary_text: raw.salary.clone(),
            job_url: raw.job_url.clone(),
            apply_url: raw.apply_url.clone(),
            apply_type: raw.apply_type.clone(),
            description: raw.description.clone(),
            contract_type: raw.contract_type.clone(),
            experience_level: raw.experience_level.clone(),
            work_type: raw.work_type.clone(),
            sector: raw.sector.clone(),
            benefits: raw.benefits.clone(),
            applications_count: raw.applications_count.clone(),
            posted_at,
            posted_time_text: raw.posted_time.clone(),
        }
    }
}

/// Filters for job listings. All narrowing, all optional.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub portals: Option<Vec<Portal>>,
    pub statuses: Option<Vec<ReviewStatus>>,
    pub location: Option<String>,
    pub min_salary: Option<f64>,
    pub company: Option<String>,
    /// Free-text search over title and company.
    pub query: Option<String>,
    pub sort: JobSort,
    pub sort_desc: bool,
}

/// Whitelisted sort columns for job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobSort {
    #[default]
    FetchedAt,
    PostedAt,
    Title,
    Company,
    SalaryMin,
}

impl JobSort {
    /// Column name as it appears in the fetched_jobs table.
    pub fn column(&self) -> &'static str {
        match self {
            JobSort::FetchedAt => "fetched_at",
            JobSort::PostedAt => "posted_at",
            JobSort::Title => "title",
            JobSort::Company => "company",
            JobSort::SalaryMin => "salary_min",
        }
    }
}

impl FromStr for JobSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetched_at" => Ok(JobSort::FetchedAt),
            "posted_at" => Ok(JobSort::PostedAt),
            "title" => Ok(JobSort::Title),
            "company" => Ok(JobSort::Company),
            "salary_min" => Ok(JobSort::SalaryMin),
            _ => Err(format!("Unknown sort column: {}", s)),
        }
    }
}
