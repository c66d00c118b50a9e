use std::fmt;
use std::time::Duration;

use reqwest::{header::HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::{ApiError, Query, Result};

/// HTTP verbs supported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logical call, created per invocation and never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    method: Method,
    url: String,
    query: Query,
    body: Option<serde_json::Value>,
}

impl Request {
    /// GET request with optional query parameters.
    pub fn get(url: impl Into<String>, query: impl Into<Query>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: query.into(),
            body: None,
        }
    }

    /// POST request carrying a JSON body.
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Query::default(),
            body: Some(body),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// Final response of a logical call, with timing metadata.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: String,
    pub(crate) elapsed: Duration,
    pub(crate) attempts: usize,
    pub(crate) limit: Duration,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(ApiError::Decode)
    }

    /// Wall-clock time from first dispatch to final outcome, backoff included.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of transport attempts, including the first.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Response-time ceiling applied to this call.
    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn is_slow(&self) -> bool {
        self.elapsed > self.limit
    }
}
