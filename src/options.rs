use std::time::Duration;

use crate::{ApiError, Method, Result, RetryPolicy};

/// Host used when `BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// What to do when a call finishes over its response-time ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PerformanceMode {
    /// Fail the call with [`ApiError::SlowResponse`].
    #[default]
    Enforce,
    /// Log a warning and return the response; see [`crate::ApiResponse::is_slow`].
    Observe,
}

/// Configures base URL, timeouts, response-time ceilings and retry behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Prefix for every request path, without a trailing `/`.
    pub base_url: String,
    /// Per-attempt transport timeout.
    pub timeout: Duration,
    /// Ceiling for a whole GET call, retries and backoff included.
    pub max_get_response_time: Duration,
    /// Ceiling for a whole POST call, retries and backoff included.
    pub max_post_response_time: Duration,
    pub retry: RetryPolicy,
    pub performance: PerformanceMode,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(10),
            max_get_response_time: Duration::from_secs(1),
            max_post_response_time: Duration::from_secs(2),
            retry: RetryPolicy::default(),
            performance: PerformanceMode::Enforce,
        }
    }
}

impl ClientOptions {
    /// Reads options from the process environment.
    ///
    /// Reads:
    /// - `BASE_URL`
    /// - `REQUEST_TIMEOUT_SEC`
    /// - `MAX_GET_RESPONSE_TIME_SEC`, `MAX_POST_RESPONSE_TIME_SEC`
    /// - `MAX_ATTEMPTS`, `BACKOFF_BASE_SEC`, `BACKOFF_CAP_SEC`
    /// - `PERFORMANCE_MODE` (`enforce` or `observe`)
    ///
    /// Unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientOptions::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let mut opts = Self::default();

        if let Some(url) = get("BASE_URL") {
            opts = opts.with_base_url(url);
        }
        if let Some(raw) = get("REQUEST_TIMEOUT_SEC") {
            opts.timeout = parse_secs("REQUEST_TIMEOUT_SEC", &raw)?;
        }
        if let Some(raw) = get("MAX_GET_RESPONSE_TIME_SEC") {
            opts.max_get_response_time = parse_secs("MAX_GET_RESPONSE_TIME_SEC", &raw)?;
        }
        if let Some(raw) = get("MAX_POST_RESPONSE_TIME_SEC") {
            opts.max_post_response_time = parse_secs("MAX_POST_RESPONSE_TIME_SEC", &raw)?;
        }
        if let Some(raw) = get("MAX_ATTEMPTS") {
            opts.retry.max_attempts = raw.parse().map_err(|_| {
                ApiError::Config(format!("MAX_ATTEMPTS must be a whole number, got '{raw}'"))
            })?;
        }
        if let Some(raw) = get("BACKOFF_BASE_SEC") {
            opts.retry.backoff_base = parse_secs("BACKOFF_BASE_SEC", &raw)?;
        }
        if let Some(raw) = get("BACKOFF_CAP_SEC") {
            opts.retry.backoff_cap = parse_secs("BACKOFF_CAP_SEC", &raw)?;
        }
        if let Some(raw) = get("PERFORMANCE_MODE") {
            opts.performance = match raw.to_ascii_lowercase().as_str() {
                "enforce" => PerformanceMode::Enforce,
                "observe" => PerformanceMode::Observe,
                _ => {
                    return Err(ApiError::Config(format!(
                        "PERFORMANCE_MODE must be 'enforce' or 'observe', got '{raw}'"
                    )))
                }
            };
        }

        Ok(opts)
    }

    /// Sets the base URL, dropping trailing slashes.
    pub fn with_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = url.as_ref().trim().trim_end_matches('/').to_owned();
        self
    }

    /// Response-time ceiling for `method`.
    pub fn ceiling_for(&self, method: Method) -> Duration {
        match method {
            Method::Get => self.max_get_response_time,
            Method::Post => self.max_post_response_time,
        }
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| ApiError::Config(format!("{key} must be a number of seconds, got '{raw}'")))?;
    Duration::try_from_secs_f64(secs).map_err(|_| {
        ApiError::Config(format!(
            "{key} must be a finite, non-negative number of seconds, got '{raw}'"
        ))
    })
}
