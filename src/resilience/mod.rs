//! 弹性模式模块：提供有界、固定间隔的轮询重试执行器。
//!
//! # Resilience Primitives Module
//!
//! The remote service runs predictions asynchronously, so waiting for one means
//! asking again until it reaches a terminal state. This module owns that loop.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`retry::PollExecutor`] | Runs an operation until it finishes, fails, or runs out of attempts |
//! | [`retry::Attempt`] | Finished / not-finished outcome of one attempt |
//! | [`retry::RetryError`] | Exhausted vs. aborted |
//!
//! ## Example
//!
//! ```rust
//! use replicate_lib_rust::resilience::retry::{Attempt, PollConfig, PollExecutor, RetryError};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let executor = PollExecutor::new(PollConfig::new(3, Duration::from_millis(1)));
//! let mut remaining = 2;
//! let value: Result<&str, RetryError<()>> = executor
//!     .run_until_done(|| {
//!         remaining -= 1;
//!         let done = remaining == 0;
//!         async move {
//!             if done { Ok(Attempt::Finished("ready")) } else { Ok(Attempt::NotFinished) }
//!         }
//!     })
//!     .await;
//! assert_eq!(value.unwrap(), "ready");
//! # });
//! ```

pub mod retry;

pub use retry::{Attempt, PollConfig, PollExecutor, RetryError};
