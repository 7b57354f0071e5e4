//! Client for a news-aggregation HTTP API.
//!
//! # Overview
//! Typed access to the read-only `top-headlines`, `everything` and `sources`
//! endpoints (plus the legacy single-source `articles` endpoint). Each call
//! encodes a parameters struct into a query string, sends one GET with the
//! `X-Api-Key` header, decodes the JSON envelope and returns either the typed
//! payload or one `NewsApiError`.
//!
//! # Design
//! - `NewsClient` is immutable after `NewsClientBuilder::build` and safe to
//!   share between threads.
//! - The network sits behind the `Transport` trait. `UreqTransport` is the
//!   default; tests inject their own.
//! - Calls take a `CancellationToken`; cancelling it (or letting its deadline
//!   pass) aborts the wait for the in-flight request.
//! - No retries, caching or pagination. Those belong to the caller.

pub mod cancel;
pub mod client;
pub mod envelope;
pub mod error;
pub mod http;
pub mod query;
pub mod types;

pub use cancel::CancellationToken;
pub use client::{NewsClient, NewsClientBuilder, ResponseMetadata, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use envelope::{Envelope, ErrorBody};
pub use error::{NewsApiError, NewsApiResult, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use query::QueryParameters;
pub use types::{
    Article, ArticleSource, ArticlesParameters, ArticlesResponse, EverythingParameters, SortBy,
    Source, SourceParameters, SourcesResponse, TopHeadlinesParameters,
};
