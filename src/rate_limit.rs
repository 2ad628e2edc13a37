//! Randomized politeness delays between upstream requests.
//!
//! The pipeline never retries; it only spaces requests out. Every pause races
//! the caller's cancellation token so a cancelled run stops waiting at once.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;

/// Inclusive millisecond range a delay is drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No waiting at all. Handy for tests.
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Draw a duration uniformly from the range. A reversed range is read as
    /// `max_ms..=min_ms`.
    pub fn draw(&self) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        if lo == hi {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

/// Sleep for a random duration from `range`, or return
/// [`ScraperError::Cancelled`] as soon as `cancel` fires.
pub async fn pause(range: DelayRange, cancel: &CancellationToken) -> Result<(), ScraperError> {
    if cancel.is_cancelled() {
        return Err(ScraperError::Cancelled);
    }
    let delay = range.draw();
    if delay.is_zero() {
        return Ok(());
    }
    tracing::debug!(delay_ms = delay.as_millis() as u64, "pausing before next request");
    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = cancel.cancelled() => Err(ScraperError::Cancelled),
    }
}
