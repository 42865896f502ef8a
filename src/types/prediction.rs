//! Prediction request and response shapes.

use super::status::{PredictionStatus, StatusClass};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Webhook events a caller can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEvent {
    Start,
    Output,
    Logs,
    Completed,
}

/// Body of a prediction submission.
///
/// `version` is only sent for versioned submissions; named-model submissions
/// carry the model in the path instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub input: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_events_filter: Option<Vec<WebhookEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl PredictionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request bound to an explicit model version (`owner/name:id` or a bare id).
    pub fn for_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..Self::default()
        }
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.input.insert(key.into(), value.into());
        self
    }

    pub fn with_inputs(mut self, inputs: Map<String, Value>) -> Self {
        self.input.extend(inputs);
        self
    }

    pub fn with_webhook(mut self, url: impl Into<String>, events: Vec<WebhookEvent>) -> Self {
        self.webhook = Some(url.into());
        self.webhook_events_filter = if events.is_empty() { None } else { Some(events) };
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub(crate) fn has_version(&self) -> bool {
        self.version.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}

/// Per-call submission directives sent as headers.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// `"wait"`, a number of seconds (`"5"`), or a preformatted `"wait=5"`.
    pub prefer_wait: Option<String>,
    /// Server-side auto-cancel deadline, e.g. `"90s"`, `"5m"`, `"1h30m"`.
    pub cancel_after: Option<String>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefer_wait(mut self, value: impl Into<String>) -> Self {
        self.prefer_wait = Some(value.into());
        self
    }

    pub fn cancel_after(mut self, value: impl Into<String>) -> Self {
        self.cancel_after = Some(value.into());
        self
    }
}

/// Timing and token usage reported for a prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predict_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_token_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_token_count: Option<u64>,
}

/// Links attached to a prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
}

/// One snapshot of a prediction as reported by the service.
///
/// Snapshots are plain values: every poll returns a new one and nothing in
/// this crate mutates a snapshot it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Empty when the service omitted the id; callers that need it go through
    /// the client's validation.
    #[serde(default)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub status: PredictionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<PredictionUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Set once the service purged input and output after its retention window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_removed: Option<bool>,
    /// `"web"` or `"api"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    /// Absolute time at which the service auto-cancels the prediction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl Prediction {
    pub fn class(&self) -> StatusClass {
        self.status.class()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn stream_url(&self) -> Option<&str> {
        self.urls
            .as_ref()
            .and_then(|u| u.stream.as_deref())
            .filter(|u| !u.is_empty())
    }

    /// Output as text: a string output as-is, an array of strings concatenated
    /// (token-streaming language models), `None` otherwise.
    pub fn output_text(&self) -> Option<String> {
        match self.output.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) if items.iter().all(Value::is_string) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .concat(),
            ),
            _ => None,
        }
    }

    /// Decode the output into a caller-chosen type.
    pub fn output_as<T: serde::de::DeserializeOwned>(&self) -> crate::Result<Option<T>> {
        match &self.output {
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn versioned_request_serializes_without_empty_options() {
        let req = PredictionRequest::for_version("abc123")
            .with_input("prompt", "a cat")
            .with_input("steps", 20);
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(
            body,
            json!({"version": "abc123", "input": {"prompt": "a cat", "steps": 20}})
        );
    }

    #[test]
    fn webhook_filter_uses_lowercase_names() {
        let req = PredictionRequest::new().with_webhook(
            "https://example.com/hook",
            vec![WebhookEvent::Start, WebhookEvent::Completed],
        );
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["webhook_events_filter"], json!(["start", "completed"]));
        assert!(body.get("version").is_none());
    }

    #[test]
    fn prediction_decodes_service_payload() {
        let p: Prediction = serde_json::from_value(json!({
            "id": "ufawqhfynnddngldkgtslldrkq",
            "model": "replicate/hello-world",
            "version": "5c7d5dc6dd8bf75c1acaa8565735e7986bc5b66206b55cca93cb72c9bf15ccaa",
            "status": "succeeded",
            "input": {"text": "Alice"},
            "output": ["hello ", "Alice"],
            "error": null,
            "logs": "",
            "metrics": {"predict_time": 0.0123},
            "urls": {
                "get": "https://api.replicate.com/v1/predictions/ufawqhfynnddngldkgtslldrkq",
                "cancel": "https://api.replicate.com/v1/predictions/ufawqhfynnddngldkgtslldrkq/cancel"
            },
            "created_at": "2022-04-26T22:13:06.224088Z",
            "data_removed": false,
            "source": "api"
        }))
        .unwrap();
        assert_eq!(p.class(), StatusClass::TerminalSuccess);
        assert_eq!(p.output_text().as_deref(), Some("hello Alice"));
        assert_eq!(p.stream_url(), None);
        assert_eq!(p.metrics.unwrap().predict_time, Some(0.0123));
    }

    #[test]
    fn missing_id_decodes_as_empty() {
        let p: Prediction = serde_json::from_value(json!({"status": "starting"})).unwrap();
        assert!(p.id.is_empty());
        assert!(!p.is_terminal());
    }
}
