use crate::client::core::PredictionClient;
use crate::config::ClientConfig;
use crate::resilience::{PollConfig, PollExecutor};
use crate::transport::{HttpTransport, TransportConfig};
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const KEYRING_SERVICE: &str = "replicate";
const KEYRING_USER: &str = "api_token";

/// Builder for [`PredictionClient`].
///
/// Poll parameters are fixed here for the lifetime of the client; there is
/// no per-call override.
pub struct PredictionClientBuilder {
    config: ClientConfig,
    api_key: Option<String>,
    base_url: Option<String>,
    retry_max_attempts: Option<u32>,
    retry_fixed_backoff: Option<Duration>,
    request_timeout: Option<Duration>,
    max_frame_bytes: Option<usize>,
}

impl PredictionClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            api_key: None,
            base_url: None,
            retry_max_attempts: None,
            retry_fixed_backoff: None,
            request_timeout: None,
            max_frame_bytes: None,
        }
    }

    /// Start from a loaded configuration; explicit setters still win.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the API base URL (mock servers, proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Total status fetches `wait_for_completion` may make. Must be positive.
    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.retry_max_attempts = Some(attempts);
        self
    }

    /// Fixed delay between two status fetches.
    pub fn retry_fixed_backoff(mut self, interval: Duration) -> Self {
        self.retry_fixed_backoff = Some(interval);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Largest single stream frame held in memory. Must be positive.
    pub fn max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = Some(bytes);
        self
    }

    fn resolve_api_key(explicit: Option<String>, configured: Option<String>) -> Option<String> {
        if let Some(key) = explicit.or(configured).filter(|k| !k.trim().is_empty()) {
            return Some(key);
        }

        // 1. Try Keyring
        if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
            if let Ok(key) = entry.get_password() {
                debug!("Using API token from OS keyring");
                return Some(key);
            }
        }

        // 2. Try Environment Variable
        std::env::var("REPLICATE_API_TOKEN")
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn build(self) -> Result<PredictionClient> {
        let api_key = Self::resolve_api_key(self.api_key, self.config.api_key.clone())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "API token required",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_details("set REPLICATE_API_TOKEN or call api_key()"),
                )
            })?;

        let max_attempts = self
            .retry_max_attempts
            .unwrap_or(self.config.poll_max_attempts);
        if max_attempts == 0 {
            return Err(Error::configuration_with_context(
                "retryMaxAttempts must be positive",
                ErrorContext::new().with_field_path("poll_max_attempts"),
            ));
        }
        let max_frame_bytes = self.max_frame_bytes.unwrap_or(self.config.max_frame_bytes);
        if max_frame_bytes == 0 {
            return Err(Error::configuration_with_context(
                "max_frame_bytes must be positive",
                ErrorContext::new().with_field_path("max_frame_bytes"),
            ));
        }

        let interval = self
            .retry_fixed_backoff
            .unwrap_or_else(|| self.config.poll_interval());

        let transport = HttpTransport::new(&TransportConfig {
            base_url: self
                .base_url
                .unwrap_or_else(|| self.config.base_url.clone()),
            api_key,
            request_timeout: self
                .request_timeout
                .unwrap_or_else(|| self.config.request_timeout()),
            connect_timeout: self.config.connect_timeout(),
        })?;

        debug!(
            base_url = transport.base_url(),
            max_attempts,
            max_frame_bytes,
            interval_ms = interval.as_millis() as u64,
            "Prediction client configured"
        );

        Ok(PredictionClient {
            transport: Arc::new(transport),
            poller: PollExecutor::new(PollConfig::new(max_attempts, interval)),
            max_frame_bytes,
        })
    }
}

impl Default for PredictionClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
