//! Retry classification and backoff schedule.
//!
//! Every attempt is reduced to an [`Outcome`]; the request loop in
//! `client.rs` only matches on it.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use reqwest::{header::HeaderMap, StatusCode};

use crate::{ApiError, RetryReason};

/// Status codes that signal a transient server-side condition.
pub const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Bounded exponential retry policy.
///
/// The wait before attempt `n` (1-based, `n >= 2`) is
/// `min(cap, max(floor, multiplier^(n-2) * base))`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `0` behaves like `1`.
    pub max_attempts: usize,
    pub backoff_base: Duration,
    pub backoff_multiplier: f64,
    pub backoff_floor: Duration,
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            backoff_floor: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub(crate) fn attempt_limit(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Wait before `attempt`. The first attempt never waits.
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exp = (attempt - 2).min(i32::MAX as usize) as i32;
        let raw = self.backoff_base.as_secs_f64() * self.backoff_multiplier.powi(exp);
        let floored = raw.max(self.backoff_floor.as_secs_f64());
        // NaN, infinity and anything past Duration::MAX land on the cap.
        Duration::try_from_secs_f64(floored)
            .map_or(self.backoff_cap, |wait| wait.min(self.backoff_cap))
    }
}

/// A response that made it through the transport, body already read.
#[derive(Debug)]
pub(crate) struct Completed {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Classification of a single attempt.
#[derive(Debug)]
pub(crate) enum Outcome {
    Success(Completed),
    Retryable(RetryReason),
    Terminal(ApiError),
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Timeouts and refused/reset/aborted connections are retryable; DNS
/// failures, malformed URLs and everything else are not.
pub fn is_retryable_transport(err: &reqwest::Error) -> bool {
    err.is_timeout() || has_retryable_io_source(err)
}

fn has_retryable_io_source(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::TimedOut
            ) {
                return true;
            }
            // io::Error::source skips a custom payload, so look inside it.
            if let Some(inner) = io_err.get_ref() {
                if has_retryable_io_source(inner) {
                    return true;
                }
            }
        }
        current = err.source();
    }
    false
}

pub(crate) fn classify_status(completed: Completed) -> Outcome {
    if is_retryable_status(completed.status) {
        Outcome::Retryable(RetryReason::Status {
            status: completed.status,
            body: completed.body,
        })
    } else {
        Outcome::Success(completed)
    }
}

pub(crate) fn classify_transport(err: reqwest::Error) -> Outcome {
    if is_retryable_transport(&err) {
        Outcome::Retryable(RetryReason::Transport(err))
    } else {
        Outcome::Terminal(ApiError::Transport(err))
    }
}
