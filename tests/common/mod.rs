//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, Server, ServerGuard};
use replicate_lib_rust::{PredictionClient, Result};
use std::time::Duration;

pub const TOKEN: &str = "r8_test_token";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Client pointed at the mock server with a fast poll loop.
    pub fn client(&self, max_attempts: u32) -> Result<PredictionClient> {
        PredictionClient::builder()
            .base_url(&self.base_url)
            .api_key(TOKEN)
            .retry_max_attempts(max_attempts)
            .retry_fixed_backoff(Duration::from_millis(10))
            .build()
    }

    /// A prediction snapshot as the service would render it.
    pub fn prediction_json(&self, id: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "model": "acme/echo",
            "version": "5c7d5dc6",
            "status": status,
            "input": {"prompt": "hi"},
            "urls": {
                "get": format!("{}/predictions/{}", self.base_url, id),
                "cancel": format!("{}/predictions/{}/cancel", self.base_url, id),
                "stream": format!("{}/streams/{}", self.base_url, id),
            },
            "created_at": "2024-05-01T12:00:00Z",
        })
    }

    pub async fn mock_json(
        &mut self,
        method: &str,
        path: &str,
        status: usize,
        body: &serde_json::Value,
    ) -> Mock {
        self.server
            .mock(method, path)
            .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// GET /predictions/{id} answering with a fixed snapshot, expected `times` times.
    pub async fn mock_status(&mut self, id: &str, body: &serde_json::Value, times: usize) -> Mock {
        self.server
            .mock("GET", format!("/predictions/{}", id).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(times)
            .create_async()
            .await
    }

    /// An SSE endpoint that plays back `frames` (already formatted, blank-line separated).
    pub async fn mock_sse_stream(&mut self, path: &str, frames: &[&str]) -> Mock {
        let body = frames
            .iter()
            .map(|frame| format!("{}\n\n", frame))
            .collect::<String>();
        self.server
            .mock("GET", path)
            .match_header("accept", "text/event-stream")
            .match_header("cache-control", "no-store")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    /// Any submission to either route; used to assert nothing was sent.
    pub async fn mock_no_submission(&mut self) -> Mock {
        self.server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await
    }
}
