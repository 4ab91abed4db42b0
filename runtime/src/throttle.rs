//! Politeness throttle between page visits.

use std::time::Duration;

/// Inserts a fixed pause between consecutive page visits.
///
/// The first `acquire` returns immediately; every later one sleeps the full
/// `delay`, however long the previous visit took.
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    first: bool,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay, first: true }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for our turn to hit the server again.
    pub async fn acquire(&mut self) {
        if self.first {
            self.first = false;
            return;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
