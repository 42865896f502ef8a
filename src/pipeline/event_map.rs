//! Demultiplexer: typed stream events -> partial prediction snapshots.
//!
//! Driven by an explicit state machine. `Open` is the only state that accepts
//! events; `done` moves to `Completed`, an `error` event or a transport error
//! moves to `Failed`, and both end the produced stream.

use crate::pipeline::Mapper;
use crate::types::{Prediction, PredictionStatus, SseEvent, StreamEvent};
use crate::{BoxStream, Error, Result};
use futures::{stream, StreamExt};
use tracing::{debug, trace};

const UNKNOWN_STREAM_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxState {
    Open,
    Completed,
    Failed,
}

/// What one inbound event turns into.
#[derive(Debug)]
pub enum Step {
    Emit(Prediction),
    Skip,
    Complete,
    Fail(Error),
}

/// Per-prediction demultiplexer.
///
/// Every emitted snapshot is derived from the initial submission response and
/// reports `processing`, including the last chunk before `done`.
#[derive(Debug, Clone)]
pub struct PredictionDemux {
    initial: Prediction,
    state: DemuxState,
}

impl PredictionDemux {
    pub fn new(initial: Prediction) -> Self {
        Self {
            initial,
            state: DemuxState::Open,
        }
    }

    pub fn state(&self) -> DemuxState {
        self.state
    }

    pub fn on_event(&mut self, event: StreamEvent) -> Step {
        if self.state != DemuxState::Open {
            return Step::Complete;
        }
        match event {
            StreamEvent::Output { data } => Step::Emit(self.snapshot(data.unwrap_or_default())),
            StreamEvent::Done => {
                debug!(prediction_id = %self.initial.id, "Prediction stream completed");
                self.state = DemuxState::Completed;
                Step::Complete
            }
            StreamEvent::Error { message } => {
                self.state = DemuxState::Failed;
                Step::Fail(Error::Stream {
                    message: message.unwrap_or_else(|| UNKNOWN_STREAM_ERROR.to_string()),
                })
            }
            StreamEvent::Other { event } => {
                trace!(prediction_id = %self.initial.id, event = %event, "Ignoring stream event");
                Step::Skip
            }
        }
    }

    /// A transport failure ends the stream with the transport's own error.
    pub fn on_transport_error(&mut self, error: Error) -> Step {
        self.state = DemuxState::Failed;
        Step::Fail(error)
    }

    fn snapshot(&self, chunk: String) -> Prediction {
        let initial = &self.initial;
        Prediction {
            id: initial.id.clone(),
            model: initial.model.clone(),
            version: initial.version.clone(),
            status: PredictionStatus::Processing,
            input: initial.input.clone(),
            output: Some(serde_json::Value::String(chunk)),
            error: None,
            logs: None,
            metrics: None,
            urls: initial.urls.clone(),
            created_at: initial.created_at.clone(),
            started_at: initial.started_at.clone(),
            completed_at: None,
            data_removed: initial.data_removed,
            source: initial.source.clone(),
            deployment: initial.deployment.clone(),
            deadline: initial.deadline.clone(),
        }
    }
}

/// Turn decoded SSE frames into a lazy stream of snapshots.
///
/// Pull-driven: one frame is read per poll of the output stream, so at most one
/// synthesized snapshot is pending. Dropping the stream drops the connection.
pub fn demultiplex(
    initial: Prediction,
    events: BoxStream<'static, SseEvent>,
) -> BoxStream<'static, Prediction> {
    let demux = PredictionDemux::new(initial);
    let stream = stream::unfold((events, demux), |(mut events, mut demux)| async move {
        loop {
            if demux.state() != DemuxState::Open {
                return None;
            }
            let step = match events.next().await {
                Some(Ok(frame)) => demux.on_event(StreamEvent::from(frame)),
                Some(Err(e)) => demux.on_transport_error(e),
                // The service closed the stream without `done`: end quietly.
                None => return None,
            };
            match step {
                Step::Emit(prediction) => return Some((Ok(prediction), (events, demux))),
                Step::Skip => continue,
                Step::Complete => return None,
                Step::Fail(e) => return Some((Err(e), (events, demux))),
            }
        }
    });
    Box::pin(stream)
}

/// [`Mapper`] stage bound to one prediction.
pub struct PredictionEventMapper {
    initial: Prediction,
}

impl PredictionEventMapper {
    pub fn new(initial: Prediction) -> Self {
        Self { initial }
    }
}

#[async_trait::async_trait]
impl Mapper for PredictionEventMapper {
    async fn map(
        &self,
        input: BoxStream<'static, SseEvent>,
    ) -> Result<BoxStream<'static, Prediction>> {
        Ok(demultiplex(self.initial.clone(), input))
    }
}
