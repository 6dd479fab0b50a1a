use thiserror::Error;

use crate::provider::RemoteRunState;

/// Application-wide error types for jobsift.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The fetch-run row could not be created. Surfaced synchronously to the
    /// caller; no background work is scheduled when this happens.
    #[error("Run creation failed: {0}")]
    RunCreation(String),

    /// Transport-level failure talking to the scraping provider.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider answered with a non-success application response.
    #[error("Provider rejected request (HTTP {status_code}): {message}")]
    ProviderRejected { status_code: u16, message: String },

    /// The remote scrape run reached a terminal state other than SUCCEEDED.
    #[error("Provider run ended in state {state}")]
    ProviderRunFailed { state: RemoteRunState },

    /// The poll budget elapsed before the remote run reached a terminal state.
    /// Distinct from a provider-reported TIMED-OUT state.
    #[error("Provider run did not complete within {waited_secs} seconds")]
    ProviderTimeout { waited_secs: u64 },

    /// A single result item failed schema validation. Per-item and non-fatal:
    /// the item is skipped and counted, the fetch continues.
    #[error("Item parse error: {0}")]
    ItemParse(String),

    /// Caller supplied an out-of-range parameter or a disallowed status
    /// transition. Rejected before any run is created or row mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested record does not exist (scoped to the calling owner).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Stable machine-readable tag for this error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::RunCreation(_) => "run_creation_failed",
            FetchError::ProviderUnavailable(_) => "provider_unavailable",
            FetchError::ProviderRejected { .. } => "provider_rejected",
            FetchError::ProviderRunFailed { .. } => "provider_run_failed",
            FetchError::ProviderTimeout { .. } => "provider_timeout",
            FetchError::ItemParse(_) => "item_parse_error",
            FetchError::Validation(_) => "validation_error",
            FetchError::NotFound(_) => "not_found",
            FetchError::Database(_) => "database_error",
            FetchError::Serialization(_) => "serialization_error",
            FetchError::Config(_) => "config_error",
        }
    }

    /// JSON payload captured on a FAILED fetch run.
    pub fn error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind(),
            "error": self.to_string(),
        })
    }
}
