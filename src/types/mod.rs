//! 类型系统模块：定义预测请求、预测快照、状态机与流式事件的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed shapes for everything that crosses the wire: the submission
//! body, the prediction snapshots the service returns, the status vocabulary and
//! the server-sent events of a streaming prediction.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PredictionRequest`] | Submission body with an opaque input map |
//! | [`SubmitOptions`] | `Prefer` / `Cancel-After` directives for one submission |
//! | [`Prediction`] | Immutable snapshot of a prediction |
//! | [`PredictionStatus`] | Remote lifecycle state |
//! | [`StatusClass`] | Terminal-success / terminal-failure / non-terminal |
//! | [`StreamEvent`] | Typed server-sent event of a streaming prediction |
//! | [`FileUpload`] | Result of uploading a file for use as input |
//!
//! ## Example
//!
//! ```rust
//! use replicate_lib_rust::types::{PredictionRequest, PredictionStatus, StatusClass};
//!
//! let request = PredictionRequest::new()
//!     .with_input("prompt", "an astronaut riding a horse")
//!     .with_input("num_outputs", 1);
//! assert!(request.version.is_none());
//!
//! assert_eq!(PredictionStatus::Processing.class(), StatusClass::NonTerminal);
//! ```

pub mod events;
pub mod file;
pub mod prediction;
pub mod status;

pub use events::{SseEvent, StreamEvent};
pub use file::{FileChecksums, FileUpload, FileUrls};
pub use prediction::{
    Metrics, Prediction, PredictionRequest, PredictionUrls, SubmitOptions, WebhookEvent,
};
pub use status::{classify, PredictionStatus, StatusClass};
