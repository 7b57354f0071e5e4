//! The news API client and its request/response pipeline.
//!
//! # Design
//! `NewsClient` holds its configuration and a shared `Transport`, and carries
//! no mutable state between calls. Every endpoint runs the same four steps:
//! `query::encode` → `build_request` → `execute` → `envelope::resolve`. Each
//! step is public so the pipeline can be driven and tested piecewise.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::cancel::CancellationToken;
use crate::envelope::{self, Envelope};
use crate::error::{NewsApiError, NewsApiResult, TransportError};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport, API_KEY_HEADER,
    USER_AGENT_HEADER,
};
use crate::query::{self, QueryParameters};
use crate::types::{
    ArticlesParameters, ArticlesResponse, EverythingParameters, SourceParameters, SourcesResponse,
    TopHeadlinesParameters,
};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const TOP_HEADLINES_ENDPOINT: &str = "top-headlines";
pub const EVERYTHING_ENDPOINT: &str = "everything";
pub const SOURCES_ENDPOINT: &str = "sources";
pub const ARTICLES_ENDPOINT: &str = "articles";

/// How often a blocked call re-checks its cancellation token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Status and headers of a completed round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

/// Builder for `NewsClient`. Every setting except the API key has a default.
pub struct NewsClientBuilder {
    api_key: String,
    base_url: String,
    user_agent: Option<String>,
    timeout: Duration,
    transport: Option<Arc<dyn Transport>>,
}

impl NewsClientBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
            transport: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Request timeout of the default transport. Ignored when a custom
    /// transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Fails with `NewsApiError::Request` if the base URL does not parse or
    /// cannot serve as a base for relative references.
    pub fn build(self) -> NewsApiResult<NewsClient> {
        let mut base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(NewsApiError::Request(format!(
                "{} cannot be used as a base URL",
                self.base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::new(self.timeout)),
        };

        Ok(NewsClient {
            base_url,
            api_key: self.api_key,
            user_agent: self.user_agent.filter(|ua| !ua.is_empty()),
            transport,
        })
    }
}

/// Client for the news API.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct NewsClient {
    base_url: Url,
    api_key: String,
    user_agent: Option<String>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for NewsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl NewsClient {
    /// A client with the default base URL, no user agent and the default
    /// `ureq` transport.
    pub fn new(api_key: impl Into<String>) -> NewsApiResult<Self> {
        NewsClientBuilder::new(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> NewsClientBuilder {
        NewsClientBuilder::new(api_key)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Headlines currently on top, optionally filtered by country, category,
    /// sources or keywords.
    pub fn top_headlines(
        &self,
        cancel: &CancellationToken,
        params: Option<&TopHeadlinesParameters>,
    ) -> NewsApiResult<ArticlesResponse> {
        self.get(cancel, TOP_HEADLINES_ENDPOINT, params)
    }

    /// Search across all indexed articles.
    pub fn everything(
        &self,
        cancel: &CancellationToken,
        params: Option<&EverythingParameters>,
    ) -> NewsApiResult<ArticlesResponse> {
        self.get(cancel, EVERYTHING_ENDPOINT, params)
    }

    pub fn sources(
        &self,
        cancel: &CancellationToken,
        params: Option<&SourceParameters>,
    ) -> NewsApiResult<SourcesResponse> {
        self.get(cancel, SOURCES_ENDPOINT, params)
    }

    /// Legacy single-source listing. `source` must be set.
    pub fn articles(
        &self,
        cancel: &CancellationToken,
        params: Option<&ArticlesParameters>,
    ) -> NewsApiResult<ArticlesResponse> {
        match params {
            Some(p) if !p.source.is_empty() => {}
            _ => {
                return Err(NewsApiError::Validation(
                    "the articles endpoint requires a source".to_string(),
                ))
            }
        }
        self.get(cancel, ARTICLES_ENDPOINT, params)
    }

    fn get<P, T>(
        &self,
        cancel: &CancellationToken,
        endpoint: &str,
        params: Option<&P>,
    ) -> NewsApiResult<T>
    where
        P: QueryParameters,
        T: DeserializeOwned + Default,
    {
        let path = query::encode(endpoint, params)?;
        let request = self.build_request(&path)?;
        let (envelope, metadata) = self.execute::<Envelope<T>>(&request, cancel)?;
        envelope::resolve(envelope, metadata.status)
    }

    /// Resolve `path_with_query` against the base URL and attach the API key
    /// and, if configured, the user agent. Performs no I/O.
    pub fn build_request(&self, path_with_query: &str) -> NewsApiResult<HttpRequest> {
        let url = self.base_url.join(path_with_query)?;

        let mut headers = vec![(API_KEY_HEADER.to_string(), self.api_key.clone())];
        if let Some(user_agent) = &self.user_agent {
            headers.push((USER_AGENT_HEADER.to_string(), user_agent.clone()));
        }

        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers,
        })
    }

    /// Send `request` and decode the body into `T`.
    ///
    /// An empty body decodes to `T::default()`. If `cancel` trips before the
    /// transport answers, the call returns the cancellation error at once and
    /// the late response is dropped undecoded.
    pub fn execute<T>(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> NewsApiResult<(T, ResponseMetadata)>
    where
        T: DeserializeOwned + Default,
    {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.send_cancellable(request, cancel).map_err(|e| {
            warn!(url = %request.url, error = %e, "request did not complete");
            e
        })?;
        debug!(status = response.status, bytes = response.body.len(), "response received");

        let HttpResponse {
            status,
            headers,
            body,
        } = response;
        let decoded = decode_body(&body).map_err(|e| {
            warn!(url = %request.url, status, error = %e, "response body did not decode");
            e
        })?;

        Ok((decoded, ResponseMetadata { status, headers }))
    }

    /// Run the transport on a worker thread and wait for it while watching
    /// the token. The worker gets the same token, so the transport stops the
    /// request itself once the token trips.
    fn send_cancellable(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        cancel.check()?;

        let (tx, rx) = mpsc::channel();
        let transport = Arc::clone(&self.transport);
        let owned = request.clone();
        let worker_cancel = cancel.clone();
        thread::Builder::new()
            .name("newsapi-transport".to_string())
            .spawn(move || {
                // The receiver is gone when the call was cancelled.
                let _ = tx.send(transport.send(&owned, &worker_cancel));
            })
            .map_err(|e| TransportError::Connection(format!("spawning transport worker: {e}")))?;

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => {
                    cancel.check()?;
                    return result;
                }
                Err(RecvTimeoutError::Timeout) => cancel.check()?,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::Connection(
                        "transport worker exited without a response".to_string(),
                    ))
                }
            }
        }
    }
}

/// Empty bodies and a bare JSON `null` leave the target at its zero value.
fn decode_body<T: DeserializeOwned + Default>(body: &str) -> NewsApiResult<T> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(body)?)
}
