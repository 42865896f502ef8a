//! 请求前置校验：预测 ID、Cancel-After 时长格式与服务响应完整性。
//!
//! Argument and response validation.

use crate::types::Prediction;
use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// `30`, `90s`, `5m`, `1h30m`, `2h5m10s` - bare numbers are seconds.
static CANCEL_AFTER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+|(?:\d+h)?(?:\d+m)?(?:\d+s)?)$").expect("static pattern")
});

pub(crate) fn validate_prediction_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::configuration_with_context(
            "Prediction ID must not be empty",
            ErrorContext::new()
                .with_field_path("prediction_id")
                .with_source("argument_validator"),
        ));
    }
    if id.contains(&['/', '?', '#', '\\'][..]) {
        return Err(Error::configuration_with_context(
            "Prediction ID contains characters that are not allowed in a URL path segment",
            ErrorContext::new()
                .with_field_path("prediction_id")
                .with_details(id.to_string())
                .with_source("argument_validator"),
        ));
    }
    Ok(id)
}

pub(crate) fn validate_cancel_after(value: &str) -> Result<()> {
    if value.is_empty() || !CANCEL_AFTER_PATTERN.is_match(value) {
        return Err(Error::configuration_with_context(
            "Cancel-After must be a duration such as \"30\", \"90s\", \"5m\" or \"1h30m\"",
            ErrorContext::new()
                .with_field_path("options.cancel_after")
                .with_details(value.to_string())
                .with_source("argument_validator"),
        ));
    }
    Ok(())
}

/// The service must hand back an id for anything it accepted.
pub(crate) fn require_id<'a>(prediction: &'a Prediction, operation: &str) -> Result<&'a str> {
    if prediction.id.trim().is_empty() {
        return Err(Error::protocol_with_context(
            format!("{} did not return a valid response", operation),
            ErrorContext::new()
                .with_field_path("prediction.id")
                .with_source("response_validator"),
        ));
    }
    Ok(&prediction.id)
}
