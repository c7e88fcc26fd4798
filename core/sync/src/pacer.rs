//! Minimum-interval gate between consecutive remote requests.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Default gap between files in a batch, to stay below the API rate limit.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(500);

/// Spaces out work so two passes through [`Pacer::wait`] are at least
/// `interval` apart. The first pass never waits.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the interval since the previous pass has elapsed.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready_at = last + self.interval;
            if Instant::now() < ready_at {
                debug!("Pacing for {:?}", ready_at - Instant::now());
                sleep_until(ready_at).await;
            }
        }
        self.last = Some(Instant::now());
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_INTERVAL)
    }
}
