//! 流水线处理模块：将 SSE 字节流解码并解复用为预测快照流。
//!
//! # Pipeline Interpreter Layer
//!
//! Streaming predictions arrive as a server-sent-event byte stream. This module
//! turns that byte stream into a lazy stream of partial [`Prediction`] snapshots.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Raw Bytes → Decoder → Event Mapper → Prediction snapshots
//!     │           │            │
//!   HTTP      SSE framing   output / done / error
//! ```
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Pipeline`] | Decoder + mapper bound to one prediction |
//! | [`Decoder`] | Trait for stream decoding |
//! | [`Mapper`] | Trait for final event mapping |
//! | [`decode::SseDecoder`] | SSE framing |
//! | [`event_map::PredictionDemux`] | Stream state machine |

pub mod decode;
pub mod event_map;

use crate::types::{Prediction, SseEvent};
use crate::{BoxStream, Result};

/// Decoder trait for stream decoding
#[async_trait::async_trait]
pub trait Decoder: Send + Sync {
    /// Decode a byte stream into SSE frames
    async fn decode_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
    ) -> Result<BoxStream<'static, SseEvent>>;
}

/// Specialized mapper for the final stage of the pipeline
#[async_trait::async_trait]
pub trait Mapper: Send + Sync {
    /// Map SSE frames to prediction snapshots
    async fn map(
        &self,
        input: BoxStream<'static, SseEvent>,
    ) -> Result<BoxStream<'static, Prediction>>;
}

/// Pipeline that processes one prediction's event stream
pub struct Pipeline {
    decoder: Box<dyn Decoder>,
    mapper: Box<dyn Mapper>,
}

impl Pipeline {
    pub fn new(decoder: Box<dyn Decoder>, mapper: Box<dyn Mapper>) -> Self {
        Self { decoder, mapper }
    }

    /// SSE decoding followed by the prediction demultiplexer.
    ///
    /// `max_frame_bytes` bounds how much of a single frame is buffered.
    pub fn for_prediction(initial: Prediction, max_frame_bytes: usize) -> Self {
        Self::new(
            Box::new(decode::SseDecoder::with_max_frame_bytes(max_frame_bytes)),
            Box::new(event_map::PredictionEventMapper::new(initial)),
        )
    }

    /// Process a byte stream through the pipeline
    pub async fn process_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
    ) -> Result<BoxStream<'static, Prediction>> {
        let frames = self.decoder.decode_stream(input).await?;
        self.mapper.map(frames).await
    }
}
