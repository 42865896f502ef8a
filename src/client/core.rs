use crate::resilience::{Attempt, PollExecutor, RetryError};
use crate::transport::HttpTransport;
use crate::types::{FileUpload, Prediction, PredictionRequest, StatusClass, SubmitOptions};
use crate::{Error, ErrorContext, Result};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::endpoint::{self, SubmissionRoute};
use super::validation;

/// Inputs up to this size are inlined as `data:` URIs instead of uploaded.
pub const INLINE_FILE_LIMIT: usize = 256 * 1024;

const UNKNOWN_FAILURE: &str = "Unknown error";

/// Client for the predictions API.
///
/// Cheap to clone; clones share the HTTP connection pool. Holds no per-call
/// state, so one instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) poller: PollExecutor,
    pub(crate) max_frame_bytes: usize,
}

impl PredictionClient {
    pub fn builder() -> super::builder::PredictionClientBuilder {
        super::builder::PredictionClientBuilder::new()
    }

    /// Build a client from `REPLICATE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        super::builder::PredictionClientBuilder::new()
            .config(crate::config::ClientConfig::from_env())
            .build()
    }

    pub fn poll_config(&self) -> &crate::resilience::PollConfig {
        self.poller.config()
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Create a prediction.
    ///
    /// Pass `model` (`owner/name`) for named models and leave `request.version`
    /// unset; pass `None` and set `request.version` for versioned models.
    /// The returned snapshot may already be terminal when the service honored a
    /// `Prefer: wait` directive.
    pub async fn submit(
        &self,
        model: Option<&str>,
        request: &PredictionRequest,
        options: &SubmitOptions,
    ) -> Result<Prediction> {
        let route = SubmissionRoute::resolve(model, request)?;
        let headers = endpoint::submission_headers(
            options.prefer_wait.as_deref(),
            options.cancel_after.as_deref(),
        )?;

        let span = tracing::debug_span!("submit", request_id = %Uuid::new_v4(), route = ?route);
        async move {
            debug!(path = %route.path(), "Submitting prediction");
            let prediction: Prediction = self
                .transport
                .post_json(&route.path(), request, headers)
                .await?;
            validation::require_id(&prediction, "Prediction request")?;
            info!(
                prediction_id = %prediction.id,
                status = %prediction.status,
                "Prediction created"
            );
            Ok(prediction)
        }
        .instrument(span)
        .await
    }

    /// Fetch the current snapshot of a prediction.
    pub async fn get_status(&self, prediction_id: &str) -> Result<Prediction> {
        let id = validation::validate_prediction_id(prediction_id)?;
        let prediction: Prediction = self
            .transport
            .get_json(&endpoint::prediction_path(id))
            .await?;
        validation::require_id(&prediction, "Prediction status request")?;
        Ok(prediction)
    }

    /// Request cancellation. Returns immediately with whatever snapshot the
    /// service reports; the status moves to `canceled` asynchronously.
    pub async fn cancel(&self, prediction_id: &str) -> Result<Prediction> {
        let id = validation::validate_prediction_id(prediction_id)?;
        let prediction: Prediction = self.transport.post_empty(&endpoint::cancel_path(id)).await?;
        validation::require_id(&prediction, "Cancel request")?;
        info!(prediction_id = %id, status = %prediction.status, "Prediction cancel requested");
        Ok(prediction)
    }

    /// Poll until the prediction succeeds.
    ///
    /// Fails with [`Error::PredictionFailed`] / [`Error::PredictionCanceled`]
    /// when the service reports a terminal failure, and with
    /// [`Error::PollingExhausted`] when the attempt cap is reached first.
    pub async fn wait_for_completion(&self, prediction_id: &str) -> Result<Prediction> {
        let id = validation::validate_prediction_id(prediction_id)?;

        let outcome = self
            .poller
            .run_until_done(|| self.poll_once(id))
            .await;

        match outcome {
            Ok(prediction) => Ok(prediction),
            Err(RetryError::Aborted(e)) => Err(e),
            Err(RetryError::Exhausted { attempts }) => {
                warn!(prediction_id = %id, attempts, "Gave up waiting for prediction");
                Err(Error::PollingExhausted {
                    id: id.to_string(),
                    attempts,
                })
            }
        }
    }

    async fn poll_once(&self, id: &str) -> Result<Attempt<Prediction>> {
        let prediction = self.get_status(id).await?;

        match prediction.class() {
            StatusClass::TerminalSuccess => Ok(Attempt::Finished(prediction)),
            StatusClass::NonTerminal => Ok(Attempt::NotFinished),
            StatusClass::TerminalFailure if prediction.status.is_cancellation() => {
                Err(Error::PredictionCanceled {
                    id: prediction.id,
                    status: prediction.status,
                })
            }
            StatusClass::TerminalFailure => Err(Error::PredictionFailed {
                message: prediction
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
                id: prediction.id,
            }),
        }
    }

    /// [`submit`](Self::submit) followed by [`wait_for_completion`](Self::wait_for_completion).
    pub async fn submit_and_wait(
        &self,
        model: Option<&str>,
        request: &PredictionRequest,
        options: &SubmitOptions,
    ) -> Result<Prediction> {
        let prediction = self.submit(model, request, options).await?;
        let id = validation::require_id(&prediction, "Prediction request")?;
        self.wait_for_completion(id).await
    }

    /// Upload a file for use as a prediction input.
    ///
    /// When the service reports a sha256 checksum it must match `bytes`.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<FileUpload> {
        if filename.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "Filename must not be empty",
                ErrorContext::new().with_field_path("filename"),
            ));
        }

        let expected = format!("{:x}", Sha256::digest(&bytes));
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type.unwrap_or("application/octet-stream"))
            .map_err(|e| Error::configuration(format!("Invalid mime: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("content", part);

        let upload: FileUpload = self
            .transport
            .post_multipart(endpoint::FILES_PATH, form)
            .await?;

        if let Some(actual) = upload.checksums.as_ref().and_then(|c| c.sha256.as_deref()) {
            if !actual.eq_ignore_ascii_case(&expected) {
                return Err(Error::protocol_with_context(
                    "Uploaded file checksum does not match",
                    ErrorContext::new()
                        .with_field_path("checksums.sha256")
                        .with_details(format!("expected {}, got {}", expected, actual))
                        .with_source("file_upload"),
                ));
            }
        }
        info!(file_id = %upload.id, size, "File uploaded");
        Ok(upload)
    }

    /// Value to place in a request's input map for a file: a `data:` URI for
    /// small payloads, otherwise the URL of an upload.
    pub async fn file_input(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mime = content_type.unwrap_or_else(|| crate::utils::mime_for_filename(filename));
        if bytes.len() <= INLINE_FILE_LIMIT {
            return Ok(serde_json::Value::String(crate::utils::to_data_uri(&bytes, mime)));
        }
        let upload = self.upload_file(bytes, filename, Some(mime)).await?;
        let url = upload.url().ok_or_else(|| {
            Error::protocol_with_context(
                "File upload response has no URL",
                ErrorContext::new().with_field_path("urls.get"),
            )
        })?;
        Ok(serde_json::Value::String(url.to_string()))
    }
}
