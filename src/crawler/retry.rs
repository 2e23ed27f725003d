//! Bounded retry for crawl operations
//!
//! Every page fetch and every book download runs through [`RetryGovernor::run`].
//! Connectivity failures are retried after a fixed backoff; any other failure
//! skips the item immediately. Running out of attempts means the network is
//! gone, and the caller is expected to halt the whole crawl.

use crate::config::CrawlerConfig;
use crate::TululuError;
use std::future::Future;
use std::time::Duration;

/// Result of one governed operation
#[derive(Debug)]
pub enum Outcome<T> {
    /// The operation succeeded
    Done(T),

    /// The operation failed permanently; move on to the next item
    Skipped(TululuError),

    /// Connectivity failed `attempts` times in a row; stop the run
    Exhausted { attempts: u32, last: TululuError },
}

/// Retry policy: fixed backoff, bounded number of consecutive attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryGovernor {
    backoff: Duration,
    max_attempts: u32,
}

impl RetryGovernor {
    /// Creates a governor; `max_attempts` is clamped to at least one
    pub fn new(backoff: Duration, max_attempts: u32) -> Self {
        Self {
            backoff,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Builds the governor from crawler settings
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.retry_backoff_ms),
            config.max_connection_retries,
        )
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `operation` until it succeeds, fails permanently, or exhausts
    /// the connectivity budget
    ///
    /// The failure counter is local to this call. No sleep follows the final
    /// failed attempt, so `k < max_attempts` connectivity failures cost exactly
    /// `k` backoff sleeps.
    ///
    /// # Arguments
    ///
    /// * `label` - Human-readable name of the item, used in log messages
    /// * `operation` - Factory producing a fresh future per attempt
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TululuError>>,
    {
        let mut failures = 0u32;

        loop {
            match operation().await {
                Ok(value) => return Outcome::Done(value),
                Err(err) if err.is_transient() => {
                    failures += 1;

                    if failures >= self.max_attempts {
                        tracing::error!(
                            "Connection problems persist for {} after {} attempts: {}",
                            label,
                            failures,
                            err
                        );
                        return Outcome::Exhausted {
                            attempts: failures,
                            last: err,
                        };
                    }

                    tracing::warn!(
                        "Connection problem for {} (attempt {}/{}), retrying in {:?}: {}",
                        label,
                        failures,
                        self.max_attempts,
                        self.backoff,
                        err
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(err) => {
                    tracing::warn!("Skipping {}: {}", label, err);
                    return Outcome::Skipped(err);
                }
            }
        }
    }
}

impl Default for RetryGovernor {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}
