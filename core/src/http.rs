//! HTTP request/response values and the transport seam.
//!
//! # Design
//! Requests and responses are plain owned data. `NewsClient` builds an
//! `HttpRequest`, hands it to a `Transport`, and decodes the `HttpResponse`
//! it gets back. Swapping the transport is how tests run without a network.
//! The default `UreqTransport` wraps a pooled `ureq::Agent`.

use std::time::Duration;

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::error::TransportError;

pub const API_KEY_HEADER: &str = "X-Api-Key";
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// HTTP method for a request. The news API is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `NewsClient::build_request`; `url` is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// First header value with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response with its body read to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Executes one HTTP round trip.
///
/// Implementations must return non-2xx responses as data rather than as
/// errors; `Err` is reserved for calls that did not complete. They are shared
/// across threads, so they must be `Send + Sync`.
///
/// `cancel` belongs to the caller. An implementation must stop the request
/// and release its connection once the token trips, at the latest when its
/// deadline passes.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by `ureq`.
///
/// Each request's global timeout is the configured timeout, shortened to
/// whatever is left of the token's deadline. When the deadline passes, ureq
/// drops the connection itself.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    /// Wrap a preconfigured agent. Its status-code handling must return
    /// non-2xx responses as data.
    pub fn from_agent(agent: ureq::Agent, timeout: Duration) -> Self {
        Self { agent, timeout }
    }

    /// Timeout for one request under `cancel`.
    pub fn effective_timeout(&self, cancel: &CancellationToken) -> Duration {
        match cancel.remaining() {
            Some(remaining) => remaining.min(self.timeout),
            None => self.timeout,
        }
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        cancel.check()?;
        let timeout = self.effective_timeout(cancel);

        let mut builder = match request.method {
            HttpMethod::Get => self.agent.get(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .config()
            .timeout_global(Some(timeout))
            .build()
            .call()
            .map_err(|e| map_ureq_error(e, cancel))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| map_ureq_error(e, cancel))?;
        debug!(status, bytes = body.len(), "ureq response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// A timeout caused by the token's deadline is reported as the token's error.
fn map_ureq_error(e: ureq::Error, cancel: &CancellationToken) -> TransportError {
    match e {
        ureq::Error::Timeout(_) => cancel.check().err().unwrap_or(TransportError::Timeout),
        other => TransportError::Connection(other.to_string()),
    }
}
