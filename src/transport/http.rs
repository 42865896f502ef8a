use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, ACCEPT, CACHE_CONTROL};
use reqwest::{Proxy, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::time::Duration;
use tracing::trace;
use url::Url;

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub api_key: String,
    /// Applies to JSON and upload requests; event streams only use the connect timeout.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

/// Thin JSON / multipart / event-stream transport over a shared `reqwest::Client`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        // A trailing slash keeps the last path segment (e.g. "/v1") when joining.
        let normalized = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL: {}", e),
                crate::ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(config.base_url.clone()),
            )
        })?;

        // No client-wide timeout: it would also cut long-lived event streams.
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(
                env::var("REPLICATE_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10))
            .user_agent(concat!("replicate-lib-rust/", env!("CARGO_PKG_VERSION")));

        if let Ok(proxy_url) = env::var("REPLICATE_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Resolve a service path or an absolute URL handed out by the service.
    pub fn resolve(&self, path_or_url: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(path_or_url) {
            return Ok(absolute);
        }
        self.base_url
            .join(path_or_url.trim_start_matches('/'))
            .map_err(|e| {
                Error::protocol_with_context(
                    format!("Cannot resolve URL: {}", e),
                    crate::ErrorContext::new().with_details(path_or_url.to_string()),
                )
            })
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.api_key)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B, headers: HeaderMap) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resolve(path)?;
        trace!(%url, "POST");
        let req = self
            .authorized(self.client.post(url))
            .timeout(self.request_timeout)
            .headers(headers)
            .json(body);
        self.send_json(req).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.resolve(path)?;
        trace!(%url, "POST");
        let req = self
            .authorized(self.client.post(url))
            .timeout(self.request_timeout);
        self.send_json(req).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.resolve(path)?;
        trace!(%url, "GET");
        let req = self
            .authorized(self.client.get(url))
            .timeout(self.request_timeout);
        self.send_json(req).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let url = self.resolve(path)?;
        trace!(%url, "POST multipart");
        let req = self
            .authorized(self.client.post(url))
            .timeout(self.request_timeout)
            .multipart(form);
        self.send_json(req).await
    }

    /// Open a server-sent-event connection and return its raw byte stream.
    ///
    /// Intermediate caches are told not to store the response.
    pub async fn open_event_stream(&self, url: &str) -> Result<BoxStream<'static, Bytes>> {
        let url = self.resolve(url)?;
        trace!(%url, "GET event-stream");
        let resp = self
            .authorized(self.client.get(url))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(remote_error(status.as_u16(), &body));
        }

        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let response = req
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        if !status.is_success() {
            return Err(remote_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::protocol_with_context(
                "Response body does not match the expected shape",
                crate::ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("http_transport"),
            )
        })
    }
}

/// Build a [`Error::Remote`] from an error response, preferring the problem
/// document's `detail` (then `title`) over the raw body.
fn remote_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["detail", "title"]
                .iter()
                .find_map(|k| json.get(*k).and_then(|v| v.as_str()).map(String::from))
        })
        .unwrap_or_else(|| body.trim().to_string());
    Error::Remote { status, message }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(&TransportConfig {
            base_url: base_url.to_string(),
            api_key: "r8_test".to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn relative_paths_keep_the_version_prefix() {
        let t = transport("https://api.replicate.com/v1");
        assert_eq!(
            t.resolve("/predictions/abc").unwrap().as_str(),
            "https://api.replicate.com/v1/predictions/abc"
        );
        assert_eq!(
            t.resolve("https://stream.replicate.com/v1/files/xyz").unwrap().as_str(),
            "https://stream.replicate.com/v1/files/xyz"
        );
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let err = HttpTransport::new(&TransportConfig {
            base_url: "not a url".to_string(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn remote_error_prefers_problem_detail() {
        let err = remote_error(
            422,
            r#"{"title":"Input validation failed","detail":"prompt is required","status":422}"#,
        );
        assert_eq!(err.to_string(), "Remote error: HTTP 422: prompt is required");

        let err = remote_error(502, "bad gateway\n");
        assert_eq!(err.to_string(), "Remote error: HTTP 502: bad gateway");
    }
}
