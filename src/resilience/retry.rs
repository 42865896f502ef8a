//! Bounded fixed-interval poll loop.
//!
//! The operation reports one of three outcomes through its signature:
//! `Ok(Attempt::Finished(v))` stops with `v`, `Ok(Attempt::NotFinished)` is the
//! only retryable outcome, and `Err(e)` stops immediately with `e`.

use std::future::Future;
use tokio::time::Duration;
use tracing::{debug, warn};

/// Result of one poll attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Finished(T),
    NotFinished,
}

/// Why the poll loop stopped without a finished value.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("operation still not finished after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("operation aborted: {0}")]
    Aborted(E),
}

/// Configuration for the poll loop. Fixed delay, no jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Total invocations allowed, the first one included. Zero runs a single
    /// attempt; the client builder rejects it before it gets here.
    pub max_attempts: u32,
    /// Delay between two invocations.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(5),
        }
    }
}

impl PollConfig {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollExecutor {
    config: PollConfig,
}

impl PollExecutor {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Run `operation` until it finishes, fails, or the attempt cap is reached.
    ///
    /// N invocations incur N-1 sleeps: there is no delay after the last attempt.
    pub async fn run_until_done<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Attempt<T>, E>>,
    {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match operation().await.map_err(RetryError::Aborted)? {
                Attempt::Finished(value) => return Ok(value),
                Attempt::NotFinished => {
                    debug!("Polling prediction: {}/{} attempts.", attempt, max_attempts);
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.interval).await;
                    }
                }
            }
        }

        warn!(
            attempts = max_attempts,
            interval_ms = self.config.interval.as_millis() as u64,
            "Poll loop exhausted before a terminal state"
        );
        Err(RetryError::Exhausted {
            attempts: max_attempts,
        })
    }
}

impl Default for PollExecutor {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}
