//! Endpoint resolution and submission headers.

use crate::types::PredictionRequest;
use crate::{Error, ErrorContext, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

pub(crate) const PREDICTIONS_PATH: &str = "/predictions";
pub(crate) const FILES_PATH: &str = "/files";

pub(crate) const PREFER_HEADER: &str = "prefer";
pub(crate) const CANCEL_AFTER_HEADER: &str = "cancel-after";

/// Where a submission goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionRoute {
    /// Named model (`owner/name`), always its latest version; no version in the body.
    Model(String),
    /// Shared endpoint; the version travels in the request body.
    Version,
}

impl SubmissionRoute {
    /// Pick the route from the model name and the request's version.
    ///
    /// Exactly one of the two must be present.
    pub fn resolve(model: Option<&str>, request: &PredictionRequest) -> Result<Self> {
        let model = model.map(str::trim).filter(|m| !m.is_empty());
        match (model, request.has_version()) {
            (Some(model), false) => Ok(SubmissionRoute::Model(model.to_string())),
            (None, true) => Ok(SubmissionRoute::Version),
            (Some(_), true) => Err(Error::configuration_with_context(
                "Cannot specify both model name and version",
                ErrorContext::new()
                    .with_field_path("request.version")
                    .with_source("route_resolver"),
            )),
            (None, false) => Err(Error::configuration_with_context(
                "Either model name or version must be specified",
                ErrorContext::new()
                    .with_field_path("model")
                    .with_source("route_resolver"),
            )),
        }
    }

    pub fn path(&self) -> String {
        match self {
            SubmissionRoute::Model(model) => format!("/models/{}{}", model, PREDICTIONS_PATH),
            SubmissionRoute::Version => PREDICTIONS_PATH.to_string(),
        }
    }
}

pub(crate) fn prediction_path(id: &str) -> String {
    format!("{}/{}", PREDICTIONS_PATH, id)
}

pub(crate) fn cancel_path(id: &str) -> String {
    format!("{}/{}/cancel", PREDICTIONS_PATH, id)
}

/// Normalize a preferred-wait value into a `Prefer` header value.
///
/// - `"wait"` -> `"wait"` (hold the response as long as the service allows)
/// - `"wait=5"` -> `"wait=5"` (already formatted)
/// - `"5"` -> `"wait=5"`
///
/// Blank input yields `None`, meaning no header.
pub fn format_prefer_wait(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else if raw == "wait" || raw.starts_with("wait=") {
        Some(raw.to_string())
    } else {
        Some(format!("wait={}", raw))
    }
}

/// Build the per-submission headers.
pub(crate) fn submission_headers(
    prefer_wait: Option<&str>,
    cancel_after: Option<&str>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(value) = prefer_wait.and_then(format_prefer_wait) {
        insert_header(&mut headers, PREFER_HEADER, &value)?;
    }
    if let Some(value) = cancel_after.map(str::trim).filter(|v| !v.is_empty()) {
        super::validation::validate_cancel_after(value)?;
        insert_header(&mut headers, CANCEL_AFTER_HEADER, value)?;
    }
    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value).map_err(|_| {
        Error::configuration_with_context(
            "Header value contains invalid characters",
            ErrorContext::new()
                .with_field_path(name)
                .with_details(value.to_string()),
        )
    })?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_model_or_version() {
        let named = SubmissionRoute::resolve(Some("black-forest-labs/flux-schnell"), &PredictionRequest::new())
            .unwrap();
        assert_eq!(named.path(), "/models/black-forest-labs/flux-schnell/predictions");

        let versioned =
            SubmissionRoute::resolve(None, &PredictionRequest::for_version("5c7d5dc6")).unwrap();
        assert_eq!(versioned, SubmissionRoute::Version);
        assert_eq!(versioned.path(), "/predictions");
    }

    #[test]
    fn both_or_neither_is_rejected() {
        let both = SubmissionRoute::resolve(Some("owner/name"), &PredictionRequest::for_version("v1"))
            .unwrap_err();
        assert!(both.is_configuration());
        assert!(both.to_string().contains("both"));

        let neither = SubmissionRoute::resolve(None, &PredictionRequest::new()).unwrap_err();
        assert!(neither.is_configuration());

        // Blank values count as absent.
        let blank = SubmissionRoute::resolve(Some("  "), &PredictionRequest::for_version(""))
            .unwrap_err();
        assert!(blank.is_configuration());
    }

    #[test]
    fn prefer_wait_formatting() {
        assert_eq!(format_prefer_wait("wait").as_deref(), Some("wait"));
        assert_eq!(format_prefer_wait("5").as_deref(), Some("wait=5"));
        assert_eq!(format_prefer_wait("wait=5").as_deref(), Some("wait=5"));
        assert_eq!(format_prefer_wait("  "), None);
    }

    #[test]
    fn headers_include_cancel_after() {
        let headers = submission_headers(Some("10"), Some("5m")).unwrap();
        assert_eq!(headers.get("prefer").unwrap(), "wait=10");
        assert_eq!(headers.get("cancel-after").unwrap(), "5m");

        let empty = submission_headers(None, Some("")).unwrap();
        assert!(empty.is_empty());
    }
}
