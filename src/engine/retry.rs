//! Bounded retry with fixed backoff

use super::outcome::{Outcome, SkipReason};
use crate::config::{millis, RetryConfig};
use crate::surface::Settle;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Runs a flaky operation up to a fixed number of attempts
///
/// The backoff is constant and only waited between attempts. Exhaustion is
/// reported as [`SkipReason::MetadataUnavailable`], never as an error.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, millis(config.backoff_ms))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Invokes `operation` until it succeeds or the attempts run out
    ///
    /// # Arguments
    ///
    /// * `settle` - Provides the backoff wait
    /// * `label` - Names the operation in log lines
    /// * `operation` - Produces a fresh future per attempt
    pub async fn run<S, T, E, F, Fut>(&self, settle: &S, label: &str, mut operation: F) -> Outcome<T>
    where
        S: Settle + ?Sized,
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Outcome::Success(value);
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}",
                        label,
                        attempt,
                        self.max_attempts,
                        last_error
                    );
                    if attempt < self.max_attempts {
                        settle.settle(self.backoff).await;
                    }
                }
            }
        }

        Outcome::Skip(SkipReason::MetadataUnavailable {
            attempts: self.max_attempts,
            last_error,
        })
    }
}
