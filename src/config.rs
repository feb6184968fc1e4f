use std::time::Duration;

use crate::error::{AutomationError, Result};

/// Default backend base URL, matching the backend's development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// How LinkedIn identity and API credentials are delivered to the backend.
///
/// Deployments differ: some expect the LinkedIn login inside each start
/// request body, some authenticate the panel with an `X-API-Key` header,
/// and some need nothing at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CredentialDelivery {
    /// Merge `linkedinUsername` / `linkedinPassword` into request bodies.
    #[default]
    Body,
    /// Send the given key as an `X-API-Key` header on every request.
    ApiKeyHeader(String),
    /// Send no credentials.
    None,
}

/// Configuration for the automation client and its coordination layer.
///
/// Use [`ClientConfig::builder()`] for ergonomic construction,
/// [`ClientConfig::from_env()`] to pick up environment overrides, or
/// [`ClientConfig::default()`] for the local development backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL including the `/api` prefix.
    pub base_url: String,

    /// Client-side timeout applied to every request.
    pub request_timeout: Duration,

    /// Interval between job status polls.
    pub poll_interval: Duration,

    /// Interval between confirmation polls after a cancel request.
    pub cancel_poll_interval: Duration,

    /// Confirmation polls before escalating to force-kill.
    pub cancel_max_attempts: u32,

    /// Credential delivery strategy.
    pub credential_delivery: CredentialDelivery,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(3000),
            cancel_poll_interval: Duration::from_millis(500),
            cancel_max_attempts: 30,
            credential_delivery: CredentialDelivery::Body,
        }
    }
}

impl ClientConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overridden by `LINKEDIN_API_BASE_URL`, `LINKEDIN_API_KEY`,
    /// `LINKEDIN_POLL_INTERVAL_MS` and `LINKEDIN_REQUEST_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("LINKEDIN_API_BASE_URL") {
            config.base_url = url;
        }
        if let Some(key) = lookup("LINKEDIN_API_KEY").filter(|k| !k.is_empty()) {
            config.credential_delivery = CredentialDelivery::ApiKeyHeader(key);
        }
        if let Some(ms) = lookup("LINKEDIN_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse_millis("LINKEDIN_POLL_INTERVAL_MS", &ms)?);
        }
        if let Some(ms) = lookup("LINKEDIN_REQUEST_TIMEOUT_MS") {
            config.request_timeout =
                Duration::from_millis(parse_millis("LINKEDIN_REQUEST_TIMEOUT_MS", &ms)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make polling or cancellation spin.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(AutomationError::Config("base URL is empty".into()));
        }
        if self.poll_interval.is_zero() || self.cancel_poll_interval.is_zero() {
            return Err(AutomationError::Config("poll intervals must be non-zero".into()));
        }
        if self.cancel_max_attempts == 0 {
            return Err(AutomationError::Config(
                "cancel_max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(AutomationError::Config(format!(
            "{} must be a positive number of milliseconds, got {:?}",
            key, raw
        ))),
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the backend base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the job status polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the confirmation interval and attempt budget used after a cancel.
    pub fn with_cancel_budget(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.config.cancel_poll_interval = interval;
        self.config.cancel_max_attempts = max_attempts;
        self
    }

    /// Set the credential delivery strategy.
    pub fn with_credential_delivery(mut self, delivery: CredentialDelivery) -> Self {
        self.config.credential_delivery = delivery;
        self
    }

    /// Build the final [`ClientConfig`].
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
