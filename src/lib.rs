//! `api-harness` is an async HTTP client for testing REST APIs.
//!
//! [`ApiClient`] wraps a pooled `reqwest` session and adds:
//! - one log line per attempt and per completed call
//! - retry with capped exponential backoff on `429/500/502/503/504`,
//!   timeouts and dropped connections
//! - a per-verb response-time ceiling over the whole call
//!
//! ```no_run
//! use api_harness::{ApiClient, StatusCode};
//!
//! # async fn run() -> api_harness::Result<()> {
//! let client = ApiClient::from_env()?;
//! let response = client.get("/users/1", ()).await?;
//! assert_eq!(response.status(), StatusCode::OK);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod options;
mod params;
pub mod retry;
mod types;

#[cfg(feature = "tracing")]
pub mod logging;

pub use client::ApiClient;
pub use error::{ApiError, RetryReason};
pub use options::{ClientOptions, PerformanceMode, DEFAULT_BASE_URL};
pub use params::Query;
pub use retry::{RetryPolicy, RETRYABLE_STATUSES};
pub use types::{ApiResponse, Method, Request};

pub use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, ApiError>;
