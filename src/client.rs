use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::config::{ClientConfig, CredentialDelivery};
use crate::credentials::Credentials;
use crate::error::{AutomationError, Result};
use crate::jobs::AutomationJob;
use crate::types::*;

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Pull a human-readable message out of an error body.
fn server_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .or_else(|| json.get("message"))
                .and_then(|v| v.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Async client for the LinkedIn automation backend.
///
/// One method per backend operation. No retries and no shared state: every
/// failure is handed back to the caller.
///
/// # Example
/// ```no_run
/// use linkedin_automation_rs::{AutomationClient, AutomationJob, ClientConfig};
///
/// # async fn example() -> linkedin_automation_rs::Result<()> {
/// let client = AutomationClient::new(ClientConfig::default());
/// let started = client.start_job(&AutomationJob::feed_engagement()).await?;
/// let status = client.job_status().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AutomationClient {
    http: Client,
    config: ClientConfig,
    credentials: Credentials,
}

impl AutomationClient {
    /// Create a client from the given configuration with fallback credentials.
    pub fn new(mut config: ClientConfig) -> Self {
        config.base_url = normalize(config.base_url);
        Self {
            http: Client::new(),
            config,
            credentials: Credentials::fallback(),
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Set the LinkedIn credentials sent with start requests and used for log paths.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // ── Job control ─────────────────────────────────────────────────

    /// Start an automation job. Validates parameters before any request.
    pub async fn start_job(&self, job: &AutomationJob) -> Result<StartResponse> {
        job.validate()?;
        let body = self.start_body(job);
        let url = self.endpoint(&["automation", job.slug(), "start"])?;
        let resp: StartResponse = self
            .request_json(
                Method::POST,
                url,
                Some(Value::Object(body)),
                &format!("Failed to start {}", job.slug()),
            )
            .await?;
        if resp.job_id.as_deref().map_or(true, str::is_empty) {
            return Err(AutomationError::InvalidResponse(
                "Start response missing jobId".into(),
            ));
        }
        Ok(resp)
    }

    /// Current status of the backend's active job slot.
    pub async fn job_status(&self) -> Result<JobStatus> {
        let url = self.endpoint(&["automation", "job", "status"])?;
        self.fetch_status(url).await
    }

    /// Status of a specific job by ID.
    pub async fn job_status_for(&self, job_id: &str) -> Result<JobStatus> {
        let url = self.endpoint(&["automation", "job", job_id, "status"])?;
        self.fetch_status(url).await
    }

    /// Ask the backend to stop the current job gracefully.
    pub async fn cancel_job(&self) -> Result<CancelResponse> {
        let url = self.endpoint(&["automation", "job", "cancel"])?;
        self.request_json(Method::POST, url, None, "Failed to cancel job")
            .await
    }

    /// Hard-stop the current job's process.
    pub async fn force_kill_job(&self) -> Result<ForceKillResponse> {
        let url = self.endpoint(&["automation", "job", "force-kill"])?;
        self.request_json(Method::POST, url, None, "Failed to force kill job")
            .await
    }

    /// Captured console output of the current or last job.
    pub async fn job_output(&self) -> Result<Value> {
        let url = self.endpoint(&["automation", "job", "output"])?;
        self.request_data(Method::GET, url, None, "Failed to fetch job output")
            .await
    }

    // ── Content ─────────────────────────────────────────────────────

    /// Generate a post draft on `topic`.
    pub async fn generate_ai_post(&self, topic: &str, options: &PostOptions) -> Result<Value> {
        let mut body = match serde_json::to_value(options)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("topic".into(), json!(topic));
        let url = self.endpoint(&["automation", "create-post", "generate-ai"])?;
        self.request_data(
            Method::POST,
            url,
            Some(Value::Object(body)),
            "Failed to generate post",
        )
        .await
    }

    /// Suggest `count` hashtags for a post.
    pub async fn generate_hashtags(&self, post_text: &str, count: u32) -> Result<Value> {
        let url = self.endpoint(&["automation", "create-post", "generate-hashtags"])?;
        self.request_data(
            Method::POST,
            url,
            Some(json!({ "postText": post_text, "count": count })),
            "Failed to generate hashtags",
        )
        .await
    }

    // ── Logs & analytics ────────────────────────────────────────────

    /// Logged activity for the current user, optionally filtered by action.
    pub async fn user_logs(&self, action: Option<&ActivityAction>) -> Result<Vec<ActivityLog>> {
        let user = self.credentials.username();
        let url = match action {
            Some(a) => self.endpoint(&["logs", "user", user, "action", a.as_str()])?,
            None => self.endpoint(&["logs", "user", user])?,
        };
        self.request_data(Method::GET, url, None, "Failed to fetch activity logs")
            .await
    }

    pub async fn stats(&self) -> Result<Value> {
        let url = self.user_endpoint("stats")?;
        self.request_data(Method::GET, url, None, "Failed to fetch stats")
            .await
    }

    pub async fn dashboard(&self) -> Result<Value> {
        let url = self.user_endpoint("dashboard")?;
        self.request_data(Method::GET, url, None, "Failed to fetch dashboard")
            .await
    }

    pub async fn activity_by_date(&self) -> Result<Value> {
        let url = self.user_endpoint("activity-by-date")?;
        self.request_data(Method::GET, url, None, "Failed to fetch activity by date")
            .await
    }

    pub async fn top_authors(&self, limit: u32) -> Result<Value> {
        let mut url = self.user_endpoint("top-authors")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        self.request_data(Method::GET, url, None, "Failed to fetch top authors")
            .await
    }

    pub async fn engagement_trends(&self, days: u32) -> Result<Value> {
        let mut url = self.user_endpoint("trends")?;
        url.query_pairs_mut().append_pair("days", &days.to_string());
        self.request_data(Method::GET, url, None, "Failed to fetch engagement trends")
            .await
    }

    /// Full activity export as CSV text.
    pub async fn download_csv(&self) -> Result<String> {
        let url = self.user_endpoint("download")?;
        let resp = self.send(Method::GET, url, None, "Failed to download CSV").await?;
        resp.text()
            .await
            .map_err(|e| AutomationError::from_transport("Failed to read CSV body", e))
    }

    /// Delete logs older than `days`.
    pub async fn delete_old_logs(&self, days: u32) -> Result<Value> {
        let url = self.user_endpoint("delete-old")?;
        self.request_data(
            Method::POST,
            url,
            Some(json!({ "days": days })),
            "Failed to delete old logs",
        )
        .await
    }

    pub async fn clear_all_logs(&self) -> Result<Value> {
        let url = self.user_endpoint("user")?;
        self.request_data(Method::DELETE, url, None, "Failed to clear logs")
            .await
    }

    // ── Plumbing ────────────────────────────────────────────────────

    fn start_body(&self, job: &AutomationJob) -> Map<String, Value> {
        let mut body = Map::new();
        if self.config.credential_delivery == CredentialDelivery::Body {
            body.insert(
                "linkedinUsername".into(),
                json!(self.credentials.username()),
            );
            body.insert(
                "linkedinPassword".into(),
                json!(self.credentials.password),
            );
        }
        body.extend(job.params());
        body
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let base = &self.config.base_url;
        let mut url = Url::parse(base)
            .map_err(|e| AutomationError::Config(format!("invalid base URL {:?}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| AutomationError::Config(format!("base URL {:?} cannot take a path", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/logs/{section}/{user}` for the current credentials.
    fn user_endpoint(&self, section: &str) -> Result<Url> {
        self.endpoint(&["logs", section, self.credentials.username()])
    }

    fn build(&self, method: Method, url: Url, body: Option<Value>) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .timeout(self.config.request_timeout);
        if let CredentialDelivery::ApiKeyHeader(key) = &self.config.credential_delivery {
            req = req.header("X-API-Key", key);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        req
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        context: &str,
    ) -> Result<reqwest::Response> {
        let path = url.path().to_string();
        tracing::debug!(%method, path = %path, "Sending backend request");
        let resp = self
            .build(method, url, body)
            .send()
            .await
            .map_err(|e| AutomationError::from_transport(context, e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body_text = resp.text().await.unwrap_or_default();
            let message = server_message(&body_text);
            tracing::debug!(path = %path, status, %message, "Backend returned error status");
            return Err(AutomationError::Http { status, message });
        }
        Ok(resp)
    }

    async fn request_value(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        context: &str,
    ) -> Result<Value> {
        self.send(method, url, body, context)
            .await?
            .json()
            .await
            .map_err(|e| AutomationError::from_transport(format!("{}: bad response body", context), e))
    }

    /// Decode the whole response body. Used where `success` sits at the top level.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        context: &str,
    ) -> Result<T> {
        let json = self.request_value(method, url, body, context).await?;
        decode(context, json)
    }

    /// Decode the `data` payload of a `{success, data}` envelope.
    async fn request_data<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        context: &str,
    ) -> Result<T> {
        let json = self.request_value(method, url, body, context).await?;
        decode(context, unwrap_envelope(json))
    }

    /// A null or absent status payload means no job is running.
    async fn fetch_status(&self, url: Url) -> Result<JobStatus> {
        let context = "Failed to fetch job status";
        let data = unwrap_envelope(self.request_value(Method::GET, url, None, context).await?);
        if data.is_null() {
            return Ok(JobStatus::idle());
        }
        decode(context, data)
    }
}

fn decode<T: DeserializeOwned>(context: &str, json: Value) -> Result<T> {
    serde_json::from_value(json).map_err(|e| {
        AutomationError::InvalidResponse(format!("{}: unexpected response shape: {}", context, e))
    })
}
