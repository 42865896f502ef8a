//! Client configuration from the environment or a YAML file.

use crate::pipeline::decode::DEFAULT_MAX_FRAME_BYTES;
use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

/// Construction-time settings of a [`crate::PredictionClient`].
///
/// Every field has a default, so a partial YAML document or an empty
/// environment still yields a usable configuration (minus the API token).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub poll_max_attempts: u32,
    pub poll_interval_ms: u64,
    /// Must exceed the service's 60 s synchronous-wait ceiling.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Cap on a single buffered server-sent-event frame.
    pub max_frame_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            poll_max_attempts: 60,
            poll_interval_ms: 5_000,
            request_timeout_secs: 90,
            connect_timeout_secs: 10,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl ClientConfig {
    /// Defaults overridden by `REPLICATE_*` environment variables.
    ///
    /// - `REPLICATE_BASE_URL`
    /// - `REPLICATE_API_TOKEN`
    /// - `REPLICATE_POLL_MAX_ATTEMPTS`
    /// - `REPLICATE_POLL_INTERVAL_MS`
    /// - `REPLICATE_HTTP_TIMEOUT_SECS`
    /// - `REPLICATE_HTTP_CONNECT_TIMEOUT_SECS`
    /// - `REPLICATE_MAX_FRAME_BYTES`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("REPLICATE_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.base_url),
            api_key: env::var("REPLICATE_API_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            poll_max_attempts: env_parse("REPLICATE_POLL_MAX_ATTEMPTS")
                .unwrap_or(defaults.poll_max_attempts),
            poll_interval_ms: env_parse("REPLICATE_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval_ms),
            request_timeout_secs: env_parse("REPLICATE_HTTP_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            connect_timeout_secs: env_parse("REPLICATE_HTTP_CONNECT_TIMEOUT_SECS")
                .unwrap_or(defaults.connect_timeout_secs),
            max_frame_bytes: env_parse("REPLICATE_MAX_FRAME_BYTES")
                .unwrap_or(defaults.max_frame_bytes),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid client configuration: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_field_path(path.display().to_string()),
            },
            other => other,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = ClientConfig::from_yaml_str(
            "base_url: http://localhost:5000/v1\npoll_max_attempts: 10\n",
        )
        .unwrap();
        assert_eq!(cfg.base_url, "http://localhost:5000/v1");
        assert_eq!(cfg.poll_max_attempts, 10);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(90));
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.max_frame_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn frame_limit_from_yaml() {
        let cfg = ClientConfig::from_yaml_str("max_frame_bytes: 1048576\n").unwrap();
        assert_eq!(cfg.max_frame_bytes, 1024 * 1024);
    }

    #[test]
    fn malformed_yaml_is_a_configuration_error() {
        let err = ClientConfig::from_yaml_str("poll_max_attempts: many").unwrap_err();
        assert!(err.is_configuration());
    }
}
