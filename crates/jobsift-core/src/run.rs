use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FetchError;

/// Lifecycle state of a fetch run.
///
/// `Running -> {Completed, Failed}`, both terminal. A run is finalized exactly
/// once; a failed run is never resumed, re-fetching means a brand-new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}

/// Job portal a run scrapes against. Stored as a plain string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    Linkedin,
    Naukri,
    Indeed,
}

impl Portal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Portal::Linkedin => "linkedin",
            Portal::Naukri => "naukri",
            Portal::Indeed => "indeed",
        }
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Portal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linkedin" => Ok(Portal::Linkedin),
            "naukri" => Ok(Portal::Naukri),
            "indeed" => Ok(Portal::Indeed),
            _ => Err(format!("Unknown portal: {}", s)),
        }
    }
}

/// Normalized scrape request parameters, persisted verbatim on the run row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_ids: Option<Vec<String>>,
    /// Provider-side posting-date filter, passed through unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub rows: u32,
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            title: None,
            location: None,
            company_names: None,
            company_ids: None,
            published_at: None,
            rows: 50,
        }
    }
}

impl FetchParams {
    /// Reject out-of-range parameters before any run row exists.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.rows < 1 || self.rows > 100 {
            return Err(FetchError::Validation(format!(
                "rows must be between 1 and 100, got {}",
                self.rows
            )));
        }
        Ok(())
    }
}

/// One end-to-end execution of the fetch pipeline for one owner/portal/filter
/// combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRun {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub portal: Portal,
    pub status: RunStatus,
    pub params: serde_json::Value,
    pub started_at: DateTime<Utc>,
    /// Set iff the run is terminal.
    pub finished_at: Option<DateTime<Utc>>,
    pub jobs_found: i32,
    pub new_jobs_added: i32,
    /// Set iff the run failed.
    pub error: Option<serde_json::Value>,
}

/// Insert payload for a new fetch run. Runs always start in `Running`.
#[derive(Debug, Clone)]
pub struct NewFetchRun {
    pub owner_id: Uuid,
    pub portal: Portal,
    pub params: serde_json::Value,
}

/// Finalization payload: counts and terminal state, assigned exactly once.
#[derive(Debug, Clone)]
pub struct RunCompletion {
    pub status: RunStatus,
    pub jobs_found: i32,
    pub new_jobs_added: i32,
    pub error: Option<serde_json::Value>,
}

impl RunCompletion {
    pub fn completed(jobs_found: i32, new_jobs_added: i32) -> Self {
        Self {
            status: RunStatus::Completed,
            jobs_found,
            new_jobs_added,
            error: None,
        }
    }

    pub fn failed(error: serde_json::Value) -> Self {
        Self {
            status: RunStatus::Failed,
            jobs_found: 0,
            new_jobs_added: 0,
            error: Some(error),
        }
    }
}

/// Aggregate result reported for a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub jobs_found: i32,
    pub new_jobs_added: i32,
}

/// Filters for run listings.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub portal: Option<Portal>,
    pub status: Option<RunStatus>,
}

/// Offset pagination, 1-indexed pages.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Page {
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.page < 1 {
            return Err(FetchError::Validation("page must be >= 1".into()));
        }
        if self.page_size < 1 || self.page_size > 100 {
            return Err(FetchError::Validation(format!(
                "page_size must be between 1 and 100, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            1
        } else {
            (total + i64::from(self.page_size) - 1) / i64::from(self.page_size)
        }
    }
}
