use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Minimum spacing between calls to one remote endpoint.
///
/// Callers queue on an async mutex; each one is handed the next free slot.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the caller may issue its request.
    pub async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut next = self.next_slot.lock().await;
        if let Some(slot) = *next {
            if slot > Instant::now() {
                sleep_until(slot).await;
            }
        }
        *next = Some(Instant::now() + self.min_interval);
    }
}
