//! Completion-call pacing
//!
//! Enforces a process-wide minimum spacing between consecutive external
//! completion calls. This is a best-effort soft limiter, not a queue: a
//! burst of concurrent callers may each independently wait out the
//! remaining delay and then proceed near-simultaneously.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

pub struct RequestPacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Suspend until the minimum spacing since the previous call has
    /// elapsed, then mark this call as the most recent.
    pub async fn pace(&self) {
        let wait = {
            let last = self.last_request.lock().await;
            last.map(|at| self.min_interval.saturating_sub(at.elapsed()))
                .unwrap_or(Duration::ZERO)
        };

        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "pacing completion call");
            tokio::time::sleep(wait).await;
        }

        *self.last_request.lock().await = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let pacer = RequestPacer::new(Duration::from_millis(1000));
        let started = Instant::now();
        pacer.pace().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_waits_out_the_interval() {
        let pacer = RequestPacer::new(Duration::from_millis(1000));
        pacer.pace().await;

        let started = tokio::time::Instant::now();
        pacer.pace().await;
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }
}
