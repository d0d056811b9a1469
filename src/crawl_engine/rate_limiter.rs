//! Inter-operation pacing
//!
//! Every renderer operation, retries included, waits until at least the
//! configured delay has passed since the previous operation started. The
//! pacer is shared across worker lanes because they all hit one origin.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct OperationPacer {
    delay: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl OperationPacer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_start: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for this operation's turn and mark it as started
    pub async fn pace(&self) {
        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.delay;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
