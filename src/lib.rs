//! # replicate-lib-rust
//!
//! Replicate 预测生命周期客户端：提交、轮询、取消与流式输出。
//!
//! Async client for the Replicate predictions API.
//!
//! ## Overview
//!
//! Predictions run asynchronously on the service. A caller submits one, then
//! either polls its status until it reaches a terminal state or attaches to
//! its server-sent-event stream for incremental output. This crate owns the
//! routing between named-model and versioned submissions, the bounded poll
//! loop, and the stream demultiplexer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use replicate_lib_rust::{PredictionClient, PredictionRequest, SubmitOptions};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> replicate_lib_rust::Result<()> {
//!     let client = PredictionClient::builder().api_key("r8_...").build()?;
//!
//!     let request = PredictionRequest::new().with_input("prompt", "a red bicycle");
//!     let done = client
//!         .submit_and_wait(Some("black-forest-labs/flux-schnell"), &request, &SubmitOptions::default())
//!         .await?;
//!     println!("{:?}", done.output);
//!
//!     // Streaming response
//!     let mut stream = client.stream(Some("meta/meta-llama-3-8b-instruct"), &request).await?;
//!     while let Some(chunk) = stream.next().await {
//!         print!("{}", chunk?.output_text().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Prediction client and builder |
//! | [`types`] | Status model, predictions, requests, stream events |
//! | [`resilience`] | Bounded fixed-interval poll executor |
//! | [`pipeline`] | SSE decoding and stream demultiplexing |
//! | [`transport`] | HTTP transport |
//! | [`config`] | Environment / YAML configuration |

pub mod client;
pub mod config;
pub mod pipeline;
pub mod resilience;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use client::{PredictionClient, PredictionClientBuilder};
pub use config::ClientConfig;
pub use types::{
    FileUpload, Prediction, PredictionRequest, PredictionStatus, StatusClass, StreamEvent,
    SubmitOptions, WebhookEvent,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
