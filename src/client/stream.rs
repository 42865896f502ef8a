//! 流式预测：提交请求后通过 SSE 连接获取增量输出。
//!
//! Streaming predictions.

use crate::pipeline::Pipeline;
use crate::types::{Prediction, PredictionRequest, SubmitOptions};
use crate::{BoxStream, Error, ErrorContext, Result};
use tracing::{debug, error};

use super::core::PredictionClient;
use super::validation;

impl PredictionClient {
    /// Submit a prediction and stream its output.
    ///
    /// Each item is a snapshot of the submitted prediction whose `output` is the
    /// next chunk of text and whose status is `processing`. The stream ends after
    /// the service's `done` event; an `error` event yields [`Error::Stream`] and
    /// a broken connection yields [`Error::Transport`]. Items already received
    /// stay valid either way.
    ///
    /// Fails before opening any connection when the submission response carries
    /// no stream URL (the model does not support streaming).
    pub async fn stream(
        &self,
        model: Option<&str>,
        request: &PredictionRequest,
    ) -> Result<BoxStream<'static, Prediction>> {
        let request = if request.stream.is_none() {
            request.clone().with_stream(true)
        } else {
            request.clone()
        };

        let initial = self.submit(model, &request, &SubmitOptions::default()).await?;
        self.stream_prediction(initial).await
    }

    /// Attach to the event stream of an already submitted prediction.
    pub async fn stream_prediction(
        &self,
        initial: Prediction,
    ) -> Result<BoxStream<'static, Prediction>> {
        validation::require_id(&initial, "Streaming prediction")?;
        let stream_url = match initial.stream_url() {
            Some(url) => url.to_string(),
            None => {
                error!(prediction_id = %initial.id, "No stream URL in response");
                return Err(Error::protocol_with_context(
                    "No stream URL returned from prediction",
                    ErrorContext::new()
                        .with_field_path("prediction.urls.stream")
                        .with_source("stream"),
                ));
            }
        };

        debug!(prediction_id = %initial.id, %stream_url, "Opening prediction stream");
        let bytes = self.transport.open_event_stream(&stream_url).await?;
        Pipeline::for_prediction(initial, self.max_frame_bytes)
            .process_stream(bytes)
            .await
    }
}
