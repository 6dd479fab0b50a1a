use std::time::Duration;

use jobsift_core::error::FetchError;
use jobsift_core::run::FetchParams;
use jobsift_core::traits::ScrapeProvider;
use jobsift_core::RemoteRunState;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";
const DEFAULT_ACTOR_ID: &str = "bebity~linkedin-jobs-scraper";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the Apify scraping provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub token: String,
    pub actor_id: String,
    /// Per-request transport timeout, separate from the orchestrator's poll
    /// budget.
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            actor_id: DEFAULT_ACTOR_ID.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Load from `APIFY_API_TOKEN`, `APIFY_ACTOR_ID`, `APIFY_BASE_URL`,
    /// and `APIFY_TIMEOUT_SECS`. Only the token is required.
    pub fn from_env() -> Result<Self, FetchError> {
        let token = std::env::var("APIFY_API_TOKEN")
            .map_err(|_| FetchError::Config("APIFY_API_TOKEN must be set".into()))?;

        let mut config = Self::new(token);
        if let Ok(actor_id) = std::env::var("APIFY_ACTOR_ID") {
            config.actor_id = actor_id;
        }
        if let Ok(base_url) = std::env::var("APIFY_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(secs) = std::env::var("APIFY_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| FetchError::Config("APIFY_TIMEOUT_SECS must be an integer".into()))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = actor_id.into();
        self
    }
}

// ---- Apify API envelope types ----

#[derive(Deserialize)]
struct RunEnvelope {
    data: RunData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunData {
    id: String,
    status: String,
    #[serde(default)]
    default_dataset_id: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Apify actor-run client.
///
/// Three remote operations against the v2 REST API: start an actor run,
/// poll its status, and read result items from its default dataset. The
/// token is passed as a query parameter, per the Apify API.
#[derive(Clone)]
pub struct ApifyClient {
    client: Client,
    config: ProviderConfig,
}

impl ApifyClient {
    pub fn new(config: ProviderConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::ProviderUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            config: ProviderConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    /// Actor input payload in the scraper's expected shape. Rows are clamped
    /// to the actor's accepted range; residential proxies are always on
    /// because the portals block datacenter ranges.
    fn build_input(params: &FetchParams) -> serde_json::Value {
        let mut input = serde_json::json!({
            "rows": params.rows.clamp(1, 100),
            "proxy": {
                "useApifyProxy": true,
                "apifyProxyGroups": ["RESIDENTIAL"],
            },
        });

        if let Some(title) = &params.title {
            input["title"] = serde_json::json!(title);
        }
        if let Some(location) = &params.location {
            input["location"] = serde_json::json!(location);
        }
        if let Some(names) = &params.company_names {
            input["companyName"] = serde_json::json!(names);
        }
        if let Some(ids) = &params.company_ids {
            input["companyId"] = serde_json::json!(ids);
        }
        if let Some(published_at) = &params.published_at {
            input["publishedAt"] = serde_json::json!(published_at);
        }
        input
    }

    fn map_transport(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::ProviderUnavailable(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs()
            ))
        } else if e.is_connect() {
            FetchError::ProviderUnavailable(format!("connection failed: {e}"))
        } else {
            FetchError::ProviderUnavailable(e.to_string())
        }
    }

    /// Turn a non-success response into `ProviderRejected`, pulling the
    /// message out of the Apify error envelope when it parses.
    async fn reject(response: reqwest::Response) -> FetchError {
        let status_code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body);
        FetchError::ProviderRejected {
            status_code,
            message,
        }
    }

    async fn get_run(&self, remote_run_id: &str) -> Result<RunData, FetchError> {
        let url = format!("{}/actor-runs/{}", self.config.base_url, remote_run_id);
        let response = self
            .client
            .get(&url)
            .query(&[("token", self.config.token.as_str())])
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let envelope: RunEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::ProviderUnavailable(format!("malformed run response: {e}")))?;
        Ok(envelope.data)
    }
}

impl ScrapeProvider for ApifyClient {
    async fn start_run(&self, params: &FetchParams) -> Result<String, FetchError> {
        let url = format!("{}/acts/{}/runs", self.config.base_url, self.config.actor_id);
        let input = Self::build_input(params);

        let response = self
            .client
            .post(&url)
            .query(&[("token", self.config.token.as_str())])
            .json(&input)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let envelope: RunEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::ProviderUnavailable(format!("malformed run response: {e}")))?;

        tracing::debug!(remote_run_id = %envelope.data.id, "Actor run started");
        Ok(envelope.data.id)
    }

    async fn poll_status(&self, remote_run_id: &str) -> Result<RemoteRunState, FetchError> {
        let run = self.get_run(remote_run_id).await?;
        run.status
            .parse()
            .map_err(FetchError::ProviderUnavailable)
    }

    async fn fetch_results(&self, remote_run_id: &str) -> Result<Vec<serde_json::Value>, FetchError> {
        let run = self.get_run(remote_run_id).await?;
        let dataset_id = run.default_dataset_id.ok_or_else(|| {
            FetchError::ProviderUnavailable(format!("no dataset for run {remote_run_id}"))
        })?;
        self.fetch_dataset_items(&dataset_id).await
    }

    async fn fetch_dataset_items(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        let url = format!("{}/datasets/{}/items", self.config.base_url, dataset_id);
        let response = self
            .client
            .get(&url)
            .query(&[("token", self.config.token.as_str())])
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::ProviderUnavailable(format!("malformed dataset response: {e}")))
    }
}
