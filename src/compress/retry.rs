//! Retry-then-fallback policy for per-file work.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What happens once all attempts for a file have failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fallback {
    /// Emit the input unchanged and record the error
    #[default]
    CopyOriginal,
    /// Fail the whole batch
    Abort,
}

/// How often to retry a failing operation, and what to do after the last failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (at least 1)
    pub max_attempts: u32,

    /// Pause between attempts
    pub backoff: Duration,

    /// Behaviour once attempts are exhausted
    pub fallback: Fallback,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::ZERO,
            fallback: Fallback::CopyOriginal,
        }
    }
}

/// The outcome of [`RetryPolicy::run`] with the number of attempts made.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that tries once.
    pub fn no_retry() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Set the total number of attempts (values below 1 are treated as 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out. `op` receives the 1-based attempt number.
    pub fn run<T, F>(&self, mut op: F) -> Attempted<T>
    where
        F: FnMut(u32) -> Result<T>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) if attempt < max && e.is_retryable() => {
                    log::debug!("attempt {}/{} failed: {}", attempt, max, e);
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    return Attempted {
                        result: Err(e),
                        attempts: attempt,
                    }
                }
            }
        }
    }
}

impl<T> Attempted<T> {
    /// Whether the operation failed after using every allowed attempt.
    pub fn exhausted(&self, policy: &RetryPolicy) -> bool {
        self.result.is_err() && self.attempts >= policy.max_attempts.max(1)
    }

    pub fn into_result(self) -> Result<T> {
        self.result
    }
}
