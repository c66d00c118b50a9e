use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;

use crate::Method;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network or request execution error from `reqwest` that is not worth retrying.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// A retryable condition was still present after the last allowed attempt.
    #[error("retries exhausted after {attempts} attempt(s): {last}")]
    RetryExhausted {
        /// Total number of attempts made, including the first one.
        attempts: usize,
        /// Condition observed on the final attempt.
        last: RetryReason,
    },
    /// The logical call completed but took longer than its ceiling.
    #[error(
        "{method} {url} response time too slow: {:.4}s > {:.2}s (status {status})",
        .elapsed.as_secs_f64(),
        .limit.as_secs_f64()
    )]
    SlowResponse {
        method: Method,
        url: String,
        status: StatusCode,
        /// Wall-clock time of every attempt and backoff wait.
        elapsed: Duration,
        limit: Duration,
    },
    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),
    /// Request body could not be serialized to JSON.
    #[error("encode error: {0}")]
    Encode(serde_json::Error),
    /// Response body could not be deserialized from JSON.
    #[error("decode error: {0}")]
    Decode(serde_json::Error),
}

/// Transient condition that triggered a retry.
#[derive(Debug)]
pub enum RetryReason {
    /// Server answered with a status from the retryable set.
    Status { status: StatusCode, body: String },
    /// Timeout or dropped connection.
    Transport(reqwest::Error),
}

impl RetryReason {
    /// Status code of the final response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, .. } => write!(f, "http status {status}"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
        }
    }
}
