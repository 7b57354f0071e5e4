//! Error types for the news API client.
//!
//! # Design
//! Every public operation returns exactly one `NewsApiError`. The variants
//! follow the order in which the pipeline can fail: validation and encoding
//! happen before a request exists, `Request` before any I/O, `Transport` and
//! `Decode` around the network call, and `Api` once the remote service has
//! answered with a structured rejection.

use thiserror::Error;

/// Failures of the underlying HTTP call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The caller cancelled the token before or during the call.
    #[error("request cancelled")]
    Cancelled,

    /// The token's deadline passed before the call completed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The transport gave up waiting for the server.
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, broken body, and similar.
    #[error("connection failed: {0}")]
    Connection(String),
}

impl TransportError {
    /// True for the variants caused by the caller's cancellation token.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Errors returned by `NewsClient` operations.
#[derive(Error, Debug)]
pub enum NewsApiError {
    /// A mandatory parameter was missing. No request was sent.
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// The parameters could not be turned into a query string.
    #[error("query encoding failed: {0}")]
    Encoding(String),

    /// The endpoint path could not be resolved against the base URL.
    #[error("invalid request URL: {0}")]
    Request(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body was not JSON of the expected shape.
    #[error("decoding response failed: {0}")]
    Decode(String),

    /// The service understood the request and rejected it. `code` and
    /// `message` are the remote values, untouched.
    #[error("[{code}] {message} (status {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

impl NewsApiError {
    /// Whether this error carries a rejection from the remote service.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

impl From<serde_json::Error> for NewsApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<url::ParseError> for NewsApiError {
    fn from(e: url::ParseError) -> Self {
        Self::Request(e.to_string())
    }
}

pub type NewsApiResult<T> = Result<T, NewsApiError>;
