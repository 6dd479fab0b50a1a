use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// State of a remote scrape run as reported by the provider.
///
/// `Ready` and `Running` are non-terminal; the remaining four are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteRunState {
    Ready,
    Running,
    Succeeded,
    Failed,
    Aborted,
    TimedOut,
}

impl RemoteRunState {
    /// Wire spelling used by the provider API.
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteRunState::Ready => "READY",
            RemoteRunState::Running => "RUNNING",
            RemoteRunState::Succeeded => "SUCCEEDED",
            RemoteRunState::Failed => "FAILED",
            RemoteRunState::Aborted => "ABORTED",
            RemoteRunState::TimedOut => "TIMED-OUT",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RemoteRunState::Ready | RemoteRunState::Running)
    }
}

impl fmt::Display for RemoteRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RemoteRunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READY" => Ok(RemoteRunState::Ready),
            "RUNNING" => Ok(RemoteRunState::Running),
            "SUCCEEDED" => Ok(RemoteRunState::Succeeded),
            "FAILED" => Ok(RemoteRunState::Failed),
            "ABORTED" => Ok(RemoteRunState::Aborted),
            "TIMED-OUT" => Ok(RemoteRunState::TimedOut),
            _ => Err(format!("Unknown remote run state: {}", s)),
        }
    }
}

/// One raw result item in the provider's scraper output schema.
///
/// Only title, jobUrl, and companyName are required; everything else the
/// provider supplies inconsistently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJobItem {
    pub title: String,
    pub job_url: String,
    pub company_name: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub company_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub applications_count: Option<String>,
    #[serde(default)]
    pub apply_url: Option<String>,
    #[serde(default)]
    pub apply_type: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub posted_time: Option<String>,
}

impl RawJobItem {
    /// Validate one raw provider item against the expected schema.
    ///
    /// Failures are per-item: the caller skips and counts them, the fetch as a
    /// whole continues.
    pub fn parse(value: &serde_json::Value) -> Result<Self, FetchError> {
        serde_json::from_value(value.clone())
            .map_err(|e| FetchError::ItemParse(format!("item failed schema validation: {e}")))
    }
}
