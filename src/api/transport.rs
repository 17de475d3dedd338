// src/api/transport.rs
//! The boundary between the client and the network.
//!
//! A transport takes a fully prepared `HttpRequest` and returns the raw
//! status and body. It owns one thing beyond moving bytes: retrying
//! transient failures under a `RetryStrategy`. When the retry budget runs
//! out it reports `TransportError`, which the pagination iterator treats as
//! the signal to shrink its page size. Every other status is handed back to
//! the caller untouched.

use crate::constants::{
    RETRY_BACKOFF_FACTOR_SECS, RETRY_MAX_BACKOFF_SECS, RETRY_STATUS_FORCELIST, RETRY_TOTAL,
};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready to go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// The body parsed back as JSON, for logging and tests.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of a response that made it back.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Notion answers every successful call with 200.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failures that survived the transport's retry budget.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Gave up on {url} after {attempts} attempts{}", last_status(.status))]
    RetriesExhausted {
        url: String,
        attempts: u32,
        status: Option<u16>,
    },

    #[error("Connection to {url} failed: {message}")]
    Connection { url: String, message: String },
}

fn last_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (last status {})", code),
        None => String::new(),
    }
}

/// Sends prepared requests from async code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// Sends prepared requests from synchronous code.
pub trait BlockingTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// When and how long to wait before resending a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryStrategy {
    /// Retries after the first attempt.
    pub total: u32,
    pub backoff_factor: Duration,
    pub max_backoff: Duration,
    pub status_forcelist: Vec<u16>,
    pub allowed_methods: Vec<Method>,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            total: RETRY_TOTAL,
            backoff_factor: Duration::from_secs_f64(RETRY_BACKOFF_FACTOR_SECS),
            max_backoff: Duration::from_secs(RETRY_MAX_BACKOFF_SECS),
            status_forcelist: RETRY_STATUS_FORCELIST.to_vec(),
            allowed_methods: vec![Method::Get, Method::Post],
        }
    }
}

/// The outcome of one attempt, as judged by the strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    /// Hand this to the caller.
    Return(T),
    /// Sleep, then send again.
    RetryAfter(Duration),
    /// The budget is spent.
    Exhausted,
}

impl RetryStrategy {
    /// A strategy that never retries.
    pub fn none() -> Self {
        Self {
            total: 0,
            ..Self::default()
        }
    }

    pub fn with_total(mut self, total: u32) -> Self {
        self.total = total;
        self
    }

    pub fn with_backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Delay before retry number `retry` (zero-based): `factor * 2^retry`,
    /// capped at `max_backoff`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let multiplier = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.backoff_factor
            .checked_mul(multiplier)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Judges the attempt numbered `attempt` (zero-based).
    ///
    /// PATCH is never retried: a connection failure or forcelisted status
    /// on a non-idempotent method goes back to the caller as it is.
    pub fn judge(
        &self,
        method: Method,
        attempt: u32,
        outcome: Result<RawResponse, TransportError>,
    ) -> Attempt<Result<RawResponse, TransportError>> {
        let transient = match &outcome {
            Ok(response) => self.is_retryable_status(response.status),
            Err(TransportError::Connection { .. }) => true,
            Err(TransportError::RetriesExhausted { .. }) => false,
        };

        if !transient || !self.allowed_methods.contains(&method) {
            return Attempt::Return(outcome);
        }
        if attempt >= self.total {
            return Attempt::Exhausted;
        }
        Attempt::RetryAfter(self.backoff(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection_error() -> TransportError {
        TransportError::Connection {
            url: "https://api.notion.com/v1/pages/x".to_string(),
            message: "reset by peer".to_string(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let strategy = RetryStrategy::default();
        assert_eq!(strategy.backoff(0), Duration::from_secs(1));
        assert_eq!(strategy.backoff(1), Duration::from_secs(2));
        assert_eq!(strategy.backoff(2), Duration::from_secs(4));
        assert_eq!(strategy.backoff(10), Duration::from_secs(30));
        assert_eq!(strategy.backoff(64), Duration::from_secs(30));
    }

    #[test]
    fn test_forcelisted_status_is_retried_until_budget_runs_out() {
        let strategy = RetryStrategy::default();
        let busy = || Ok(RawResponse::new(503, "busy"));

        assert_eq!(
            strategy.judge(Method::Get, 0, busy()),
            Attempt::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(
            strategy.judge(Method::Post, 2, busy()),
            Attempt::RetryAfter(Duration::from_secs(4))
        );
        assert_eq!(strategy.judge(Method::Get, 3, busy()), Attempt::Exhausted);
    }

    #[test]
    fn test_client_errors_are_returned_immediately() {
        let strategy = RetryStrategy::default();
        let outcome = strategy.judge(Method::Get, 0, Ok(RawResponse::new(404, "{}")));
        assert!(matches!(outcome, Attempt::Return(Ok(ref r)) if r.status == 404));
    }

    #[test]
    fn test_patch_is_never_retried() {
        let strategy = RetryStrategy::default();
        let outcome = strategy.judge(Method::Patch, 0, Err(connection_error()));
        assert_eq!(outcome, Attempt::Return(Err(connection_error())));
    }

    #[test]
    fn test_connection_failures_are_transient() {
        let strategy = RetryStrategy::none();
        assert_eq!(
            strategy.judge(Method::Get, 0, Err(connection_error())),
            Attempt::Exhausted
        );
    }

    #[test]
    fn test_request_accessors() {
        let request = HttpRequest {
            method: Method::Post,
            url: "https://api.notion.com/v1/databases/d/query".to_string(),
            headers: vec![("Notion-Version".to_string(), "2022-06-28".to_string())],
            query: vec![("page_size".to_string(), "20".to_string())],
            body: Some(br#"{"page_size":20}"#.to_vec()),
        };
        assert_eq!(request.header("notion-version"), Some("2022-06-28"));
        assert_eq!(request.query_param("page_size"), Some("20"));
        assert_eq!(request.json_body().unwrap()["page_size"], 20);
        assert_eq!(
            TransportError::RetriesExhausted {
                url: request.url.clone(),
                attempts: 4,
                status: Some(502)
            }
            .to_string(),
            "Gave up on https://api.notion.com/v1/databases/d/query after 4 attempts (last status 502)"
        );
    }
}
