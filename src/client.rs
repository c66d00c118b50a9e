use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tokio::time::sleep;

use crate::{
    retry::{classify_status, classify_transport, Completed, Outcome},
    ApiError, ApiResponse, ClientOptions, PerformanceMode, Query, Request, Result,
};

#[derive(Clone)]
/// HTTP client that logs, retries transient failures and checks response times.
///
/// Cloning is cheap; clones share the same connection pool.
pub struct ApiClient {
    http: reqwest::Client,
    options: ClientOptions,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.options.base_url)
            .field("options", &self.options)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client for `base_url` with default timeouts, ceilings and retry policy.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::from_options(ClientOptions::default().with_base_url(base_url))
    }

    /// Creates a client from a complete set of options.
    pub fn from_options(options: ClientOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            options,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// See [`ClientOptions::from_env`] for the variables read. Returns
    /// [`ApiError::Config`] if any of them is malformed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use api_harness::ApiClient;
    ///
    /// let client = ApiClient::from_env().expect("invalid environment configuration");
    /// ```
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_options(ClientOptions::from_env()?))
    }

    /// Replaces all options, base URL included. The connection pool is kept.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Appends `path` verbatim to the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.options.base_url, path)
    }

    /// Sends a GET request to `path` with optional query parameters.
    pub async fn get<Q: Into<Query>>(&self, path: &str, params: Q) -> Result<ApiResponse> {
        self.execute(Request::get(self.url_for(path), params)).await
    }

    /// Sends a POST request to `path` with `body` serialized as JSON.
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.execute(Request::post(self.url_for(path), body)).await
    }

    /// Runs one logical call: attempts, backoff waits and the final
    /// response-time check.
    ///
    /// A status outside the retryable set is returned as a response, even
    /// for 4xx/5xx. A retryable condition that survives the last attempt
    /// becomes [`ApiError::RetryExhausted`].
    pub async fn execute(&self, request: Request) -> Result<ApiResponse> {
        let policy = &self.options.retry;
        let max_attempts = policy.attempt_limit();
        let started = Instant::now();
        let mut attempt = 1usize;

        let completed = loop {
            match self.dispatch(&request, attempt).await {
                Outcome::Success(completed) => break completed,
                Outcome::Terminal(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        "{} {} failed on attempt {}: {} | Duration: {:.4} sec",
                        request.method(),
                        request.url(),
                        attempt,
                        err,
                        started.elapsed().as_secs_f64()
                    );
                    return Err(err);
                }
                Outcome::Retryable(reason) => {
                    if attempt >= max_attempts {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            "{} {} giving up after {} attempt(s): {} | Duration: {:.4} sec",
                            request.method(),
                            request.url(),
                            attempt,
                            reason,
                            started.elapsed().as_secs_f64()
                        );
                        return Err(ApiError::RetryExhausted {
                            attempts: attempt,
                            last: reason,
                        });
                    }

                    attempt += 1;
                    let delay = policy.backoff_for(attempt);

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "{} {} got {}; retrying in {:.2}s (attempt {}/{})",
                        request.method(),
                        request.url(),
                        reason,
                        delay.as_secs_f64(),
                        attempt,
                        max_attempts
                    );

                    sleep(delay).await;
                }
            }
        };

        let elapsed = started.elapsed();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Response status: {} | Duration: {:.4} sec",
            completed.status.as_u16(),
            elapsed.as_secs_f64()
        );

        let response = ApiResponse {
            status: completed.status,
            headers: completed.headers,
            body: completed.body,
            elapsed,
            attempts: attempt,
            limit: self.options.ceiling_for(request.method()),
        };
        self.check_performance(&request, response)
    }

    async fn dispatch(&self, request: &Request, attempt: usize) -> Outcome {
        #[cfg(feature = "tracing")]
        log_attempt(request, attempt);
        #[cfg(not(feature = "tracing"))]
        let _ = attempt;

        let mut builder = self
            .http
            .request(request.method().to_reqwest(), request.url())
            .timeout(self.options.timeout);
        if !request.query().is_empty() {
            builder = builder.query(request.query().as_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status();
                let headers = response.headers().clone();
                match response.text().await {
                    Ok(body) => classify_status(Completed {
                        status,
                        headers,
                        body,
                    }),
                    Err(err) => classify_transport(err),
                }
            }
            Err(err) => classify_transport(err),
        }
    }

    fn check_performance(&self, request: &Request, response: ApiResponse) -> Result<ApiResponse> {
        if !response.is_slow() {
            return Ok(response);
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(
            "{} response time too slow: {:.4}s > {:.2}s",
            request.method(),
            response.elapsed.as_secs_f64(),
            response.limit.as_secs_f64()
        );

        match self.options.performance {
            PerformanceMode::Observe => Ok(response),
            PerformanceMode::Enforce => Err(ApiError::SlowResponse {
                method: request.method(),
                url: request.url().to_owned(),
                status: response.status,
                elapsed: response.elapsed,
                limit: response.limit,
            }),
        }
    }
}

#[cfg(feature = "tracing")]
fn log_attempt(request: &Request, attempt: usize) {
    match request.body() {
        Some(body) => tracing::info!(
            "{} {} json={} (attempt {})",
            request.method(),
            request.url(),
            body,
            attempt
        ),
        None => tracing::info!(
            "{} {} params={} (attempt {})",
            request.method(),
            request.url(),
            request.query(),
            attempt
        ),
    }
}
