//! Fixed pacing between requests to the origin server
//!
//! The origin is hit strictly sequentially, with a fixed pause between one
//! operation and the next whether or not the previous one succeeded.

use crate::config::CrawlerConfig;
use std::time::Duration;

/// Inserts a fixed delay between consecutive operations
#[derive(Debug, Clone)]
pub struct Pacer {
    /// Pause inserted before every operation but the first
    interval: Duration,

    /// Number of operations started so far
    started: u64,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: 0,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(Duration::from_millis(config.request_delay_ms))
    }

    /// Waits until the next operation may start
    ///
    /// The first call returns immediately; every later call sleeps for the
    /// configured interval.
    pub async fn pace(&mut self) {
        if self.started > 0 && !self.interval.is_zero() {
            tracing::trace!("Pacing for {:?}", self.interval);
            tokio::time::sleep(self.interval).await;
        }
        self.started += 1;
    }

    /// Starts a new sequence, so the next operation does not wait
    pub fn reset(&mut self) {
        self.started = 0;
    }
}
