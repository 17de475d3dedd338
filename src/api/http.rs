// src/api/http.rs
//! reqwest-backed transports.
//!
//! Both transports run the same loop: send, let the `RetryStrategy` judge
//! the outcome, sleep and resend or hand the result back. The async one
//! sleeps on the tokio timer, the blocking one on the calling thread.

use super::transport::{
    Attempt, BlockingTransport, HttpRequest, Method, RawResponse, RetryStrategy, Transport,
    TransportError,
};
use async_trait::async_trait;
use std::time::Duration;

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
    }
}

fn connection_error(url: &str, err: reqwest::Error) -> TransportError {
    TransportError::Connection {
        url: url.to_string(),
        message: err.to_string(),
    }
}

fn exhausted(
    request: &HttpRequest,
    attempts: u32,
    last: &Result<RawResponse, TransportError>,
) -> TransportError {
    log::error!(
        "{} {} failed after {} attempts",
        request.method,
        request.url,
        attempts
    );
    TransportError::RetriesExhausted {
        url: request.url.clone(),
        attempts,
        status: last.as_ref().ok().map(|response| response.status),
    }
}

fn log_retry(
    request: &HttpRequest,
    attempt: u32,
    last: &Result<RawResponse, TransportError>,
    delay: Duration,
) {
    match last {
        Ok(response) => log::warn!(
            "{} {} returned {}, retry {} in {:?}",
            request.method,
            request.url,
            response.status,
            attempt + 1,
            delay
        ),
        Err(err) => log::warn!(
            "{} {} failed ({}), retry {} in {:?}",
            request.method,
            request.url,
            err,
            attempt + 1,
            delay
        ),
    }
}

/// Async transport over a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    retry: RetryStrategy,
}

impl ReqwestTransport {
    pub fn new(retry: RetryStrategy) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, retry })
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest(request.method), &request.url)
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| connection_error(&request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| connection_error(&request.url, e))?;
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let mut attempt = 0;
        loop {
            log::debug!("{} {}", request.method, request.url);
            let outcome = self.attempt(&request).await;
            let last = outcome.clone();
            match self.retry.judge(request.method, attempt, outcome) {
                Attempt::Return(result) => return result,
                Attempt::RetryAfter(delay) => {
                    log_retry(&request, attempt, &last, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Attempt::Exhausted => return Err(exhausted(&request, attempt + 1, &last)),
            }
        }
    }
}

/// Blocking transport for callers without a runtime.
#[derive(Clone)]
pub struct ReqwestBlockingTransport {
    client: reqwest::blocking::Client,
    retry: RetryStrategy,
}

impl ReqwestBlockingTransport {
    pub fn new(retry: RetryStrategy) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client, retry })
    }

    fn attempt(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest(request.method), &request.url)
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .map_err(|e| connection_error(&request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| connection_error(&request.url, e))?;
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

impl BlockingTransport for ReqwestBlockingTransport {
    fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let mut attempt = 0;
        loop {
            log::debug!("{} {}", request.method, request.url);
            let outcome = self.attempt(&request);
            let last = outcome.clone();
            match self.retry.judge(request.method, attempt, outcome) {
                Attempt::Return(result) => return result,
                Attempt::RetryAfter(delay) => {
                    log_retry(&request, attempt, &last, delay);
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Attempt::Exhausted => return Err(exhausted(&request, attempt + 1, &last)),
            }
        }
    }
}
