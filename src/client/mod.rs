//! 客户端模块：预测的提交、状态查询、取消、轮询等待与流式输出。
//!
//! # Client Module
//!
//! [`PredictionClient`] is the single entry point. It owns the routing decision
//! between named-model and versioned submissions, the bounded poll loop behind
//! [`PredictionClient::wait_for_completion`], and the streaming entry point.
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | `submit` | Create a prediction, optionally with `Prefer` / `Cancel-After` |
//! | `get_status` | Fetch the current snapshot |
//! | `cancel` | Request cancellation |
//! | `wait_for_completion` | Poll until succeeded, failed, canceled or out of attempts |
//! | `submit_and_wait` | `submit` + `wait_for_completion` |
//! | `stream` | Submit and stream incremental output over SSE |
//! | `upload_file` / `file_input` | Make local files usable as inputs |

pub mod builder;
mod core;
pub mod endpoint;
mod stream;
mod validation;

pub use builder::PredictionClientBuilder;
pub use core::{PredictionClient, INLINE_FILE_LIMIT};
pub use endpoint::{format_prefer_wait, SubmissionRoute};
