//! Helps callers poll the client in a loop.

use std::time::Duration;

use log::debug;

use crate::client::ClientError;

/// Computes the delay between two polls.
///
/// Successful polls are spaced by a fixed interval. Transient errors (see
/// [`ClientError::is_transient`]) double the delay up to a maximum, any other
/// error stops polling.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Backoff {
    interval: Duration,
    max_delay: Duration,
    current: Duration,
}

impl Backoff {
    /// Creates a backoff polling every `interval` and waiting at most
    /// `max_delay` after transient errors.
    pub fn new(interval: Duration, max_delay: Duration) -> Self {
        let max_delay = max_delay.max(interval);

        Self {
            interval,
            max_delay,
            current: interval,
        }
    }

    /// Returns the delay before the next poll, or [`None`] if polling should
    /// stop.
    pub fn next<T>(&mut self, result: &Result<T, ClientError>) -> Option<Duration> {
        match result {
            Ok(_) => {
                self.reset();
                Some(self.interval)
            },
            Err(err) if err.is_transient() => {
                let delay = self.current;
                self.current = self.current.saturating_mul(2).min(self.max_delay);
                debug!("transient error ({err}), next poll in {delay:?}");
                Some(delay)
            },
            Err(_) => None,
        }
    }

    /// Forgets all previous errors.
    pub fn reset(&mut self) {
        self.current = self.interval;
    }
}
