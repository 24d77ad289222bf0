//! Single-slot delayed trigger.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Holds at most one scheduled value. Scheduling again replaces both the value and the
/// deadline, so a burst of inputs collapses into the last one.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T) {
        self.pending = Some((Instant::now() + self.delay, value));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    /// Resolves with the scheduled value once its quiet period has elapsed.
    ///
    /// Pends forever while nothing is scheduled. Dropping the future before it resolves
    /// leaves the schedule untouched, so it is safe to use in `tokio::select!`.
    pub async fn ready(&mut self) -> T {
        loop {
            let Some((deadline, _)) = &self.pending else {
                return std::future::pending().await;
            };
            sleep_until(*deadline).await;
            if let Some((_, value)) = self.pending.take() {
                return value;
            }
        }
    }
}
