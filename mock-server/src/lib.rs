//! In-memory stand-in for the news API, served with axum.
//!
//! Serves `/v2/top-headlines`, `/v2/everything`, `/v2/sources` and the legacy
//! `/v2/articles` from a fixed fixture set. It checks the `X-Api-Key` header,
//! enforces the parameter rules of the real service, paginates, and counts
//! every request it receives so tests can assert how many calls were made.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

pub const DEFAULT_API_KEY: &str = "mock-key";
pub const API_KEY_HEADER: &str = "x-api-key";
const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: ArticleSource,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: String,
    pub content: Option<String>,
    #[serde(skip)]
    pub country: String,
    #[serde(skip)]
    pub category: String,
    #[serde(skip)]
    pub language: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub language: String,
    pub country: String,
}

/// Shared server state: accepted key, artificial latency and a request
/// counter.
#[derive(Clone, Debug)]
pub struct MockState {
    pub api_key: String,
    pub delay: Duration,
    pub requests: Arc<AtomicUsize>,
    articles: Arc<Vec<Article>>,
    sources: Arc<Vec<Source>>,
}

impl MockState {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            delay: Duration::ZERO,
            requests: Arc::new(AtomicUsize::new(0)),
            articles: Arc::new(fixture_articles()),
            sources: Arc::new(fixture_sources()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY)
    }
}

pub fn app() -> Router {
    app_with_state(MockState::default())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/v2/top-headlines", get(top_headlines))
        .route("/v2/everything", get(everything))
        .route("/v2/sources", get(sources))
        .route("/v2/articles", get(articles))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

type Params = Query<HashMap<String, String>>;

fn api_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "status": "error", "code": code, "message": message })),
    )
        .into_response()
}

/// Count the request, apply the configured delay and check the API key.
async fn admit(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        None | Some("") => Err(api_error(
            StatusCode::UNAUTHORIZED,
            "apiKeyMissing",
            "Your API key is missing. Append this to the URL with the apiKey param, or use the x-api-key HTTP header.",
        )),
        Some(key) if key != state.api_key => Err(api_error(
            StatusCode::UNAUTHORIZED,
            "apiKeyInvalid",
            "Your API key is invalid or incorrect.",
        )),
        Some(_) => Ok(()),
    }
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

fn list_param(params: &HashMap<String, String>, name: &str) -> Vec<String> {
    param(params, name)
        .map(|v| v.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

fn matches_keywords(article: &Article, q: Option<&str>) -> bool {
    let Some(q) = q else { return true };
    let q = q.to_lowercase();
    article.title.to_lowercase().contains(&q)
        || article
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&q))
}

fn in_sources(article: &Article, sources: &[String]) -> bool {
    sources.is_empty()
        || article
            .source
            .id
            .as_ref()
            .is_some_and(|id| sources.contains(id))
}

/// Slice `articles` according to `page` / `pageSize` and wrap them in the
/// success envelope.
fn paginate(articles: Vec<Article>, params: &HashMap<String, String>) -> Result<Response, Response> {
    let page_size = match param(params, "pageSize") {
        Some(v) => v.parse::<usize>().ok().filter(|n| (1..=MAX_PAGE_SIZE).contains(n)),
        None => Some(DEFAULT_PAGE_SIZE),
    };
    let page = match param(params, "page") {
        Some(v) => v.parse::<usize>().ok().filter(|n| *n >= 1),
        None => Some(1),
    };
    let (Some(page_size), Some(page)) = (page_size, page) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "parameterInvalid",
            "page and pageSize must be positive integers, pageSize at most 100.",
        ));
    };

    let total = articles.len();
    let items: Vec<Article> = articles
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();
    Ok(Json(json!({ "status": "ok", "totalResults": total, "articles": items })).into_response())
}

async fn top_headlines(State(state): State<MockState>, headers: HeaderMap, Query(params): Params) -> Response {
    if let Err(resp) = admit(&state, &headers).await {
        return resp;
    }
    tracing::info!(?params, "top-headlines");

    let country = param(&params, "country");
    let category = param(&params, "category");
    let q = param(&params, "q");
    let sources = list_param(&params, "sources");

    if country.is_none() && category.is_none() && q.is_none() && sources.is_empty() {
        return api_error(
            StatusCode::BAD_REQUEST,
            "parametersMissing",
            "Required parameters are missing. Please set any of the following parameters and try again: sources, q, country, category.",
        );
    }
    if !sources.is_empty() && (country.is_some() || category.is_some()) {
        return api_error(
            StatusCode::BAD_REQUEST,
            "parametersIncompatible",
            "You cannot mix the sources parameter with the country or category parameters.",
        );
    }

    let found: Vec<Article> = state
        .articles
        .iter()
        .filter(|a| country.map_or(true, |c| a.country == c))
        .filter(|a| category.map_or(true, |c| a.category == c))
        .filter(|a| in_sources(a, &sources))
        .filter(|a| matches_keywords(a, q))
        .cloned()
        .collect();
    paginate(found, &params).unwrap_or_else(|resp| resp)
}

async fn everything(State(state): State<MockState>, headers: HeaderMap, Query(params): Params) -> Response {
    if let Err(resp) = admit(&state, &headers).await {
        return resp;
    }
    tracing::info!(?params, "everything");

    let q = param(&params, "q");
    let sources = list_param(&params, "sources");
    let domains = list_param(&params, "domains");
    let excluded = list_param(&params, "excludeDomains");
    let language = param(&params, "language");

    if q.is_none() && sources.is_empty() && domains.is_empty() {
        return api_error(
            StatusCode::BAD_REQUEST,
            "parametersMissing",
            "Required parameters are missing, the scope of your search is too broad. Please set any of the following required parameters and try again: q, sources, domains.",
        );
    }

    let mut found: Vec<Article> = state
        .articles
        .iter()
        .filter(|a| matches_keywords(a, q))
        .filter(|a| in_sources(a, &sources))
        .filter(|a| domains.is_empty() || domains.iter().any(|d| a.url.contains(d.as_str())))
        .filter(|a| !excluded.iter().any(|d| a.url.contains(d.as_str())))
        .filter(|a| language.map_or(true, |l| a.language == l))
        .cloned()
        .collect();

    if param(&params, "sortBy") == Some("publishedAt") {
        // RFC 3339 UTC timestamps sort lexically.
        found.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }
    paginate(found, &params).unwrap_or_else(|resp| resp)
}

async fn sources(State(state): State<MockState>, headers: HeaderMap, Query(params): Params) -> Response {
    if let Err(resp) = admit(&state, &headers).await {
        return resp;
    }
    tracing::info!(?params, "sources");

    let category = param(&params, "category");
    let language = param(&params, "language");
    let country = param(&params, "country");

    let found: Vec<Source> = state
        .sources
        .iter()
        .filter(|s| category.map_or(true, |c| s.category == c))
        .filter(|s| language.map_or(true, |l| s.language == l))
        .filter(|s| country.map_or(true, |c| s.country == c))
        .cloned()
        .collect();
    Json(json!({ "status": "ok", "sources": found })).into_response()
}

async fn articles(State(state): State<MockState>, headers: HeaderMap, Query(params): Params) -> Response {
    if let Err(resp) = admit(&state, &headers).await {
        return resp;
    }
    tracing::info!(?params, "articles");

    let Some(source) = param(&params, "source") else {
        return api_error(
            StatusCode::BAD_REQUEST,
            "sourceMissing",
            "You need to specify a source.",
        );
    };
    let found: Vec<Article> = state
        .articles
        .iter()
        .filter(|a| a.source.id.as_deref() == Some(source))
        .cloned()
        .collect();
    if found.is_empty() {
        return api_error(
            StatusCode::BAD_REQUEST,
            "sourceDoesntExist",
            "The news source you've entered doesn't exist.",
        );
    }
    Json(json!({ "status": "ok", "totalResults": found.len(), "articles": found })).into_response()
}

fn article(
    source: (&str, &str),
    title: &str,
    url: &str,
    published_at: &str,
    country: &str,
    category: &str,
) -> Article {
    Article {
        source: ArticleSource {
            id: Some(source.0.to_string()),
            name: source.1.to_string(),
        },
        author: Some(format!("{} staff", source.1)),
        title: title.to_string(),
        description: Some(format!("{title}.")),
        url: url.to_string(),
        url_to_image: None,
        published_at: published_at.to_string(),
        content: None,
        country: country.to_string(),
        category: category.to_string(),
        language: "en".to_string(),
    }
}

fn fixture_articles() -> Vec<Article> {
    vec![
        article(
            ("bbc-news", "BBC News"),
            "Markets rally as inflation cools",
            "https://www.bbc.co.uk/news/business-1",
            "2024-03-01T08:00:00Z",
            "gb",
            "business",
        ),
        article(
            ("techcrunch", "TechCrunch"),
            "Rust adoption grows in systems teams",
            "https://techcrunch.com/2024/03/02/rust-adoption",
            "2024-03-02T09:30:00Z",
            "us",
            "technology",
        ),
        article(
            ("the-verge", "The Verge"),
            "New phones announced at spring event",
            "https://www.theverge.com/2024/3/3/phones",
            "2024-03-03T17:45:00Z",
            "us",
            "technology",
        ),
        article(
            ("bbc-news", "BBC News"),
            "Weather warning issued for the weekend",
            "https://www.bbc.co.uk/news/uk-2",
            "2024-03-04T06:15:00Z",
            "gb",
            "general",
        ),
        article(
            ("techcrunch", "TechCrunch"),
            "Startup raises funding for Rust tooling",
            "https://techcrunch.com/2024/03/05/rust-tooling",
            "2024-03-05T12:00:00Z",
            "us",
            "business",
        ),
    ]
}

fn source(id: &str, name: &str, url: &str, category: &str, country: &str) -> Source {
    Source {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("News from {name}."),
        url: url.to_string(),
        category: category.to_string(),
        language: "en".to_string(),
        country: country.to_string(),
    }
}

fn fixture_sources() -> Vec<Source> {
    vec![
        source("bbc-news", "BBC News", "https://www.bbc.co.uk/news", "general", "gb"),
        source("techcrunch", "TechCrunch", "https://techcrunch.com", "technology", "us"),
        source("the-verge", "The Verge", "https://www.theverge.com", "technology", "us"),
    ]
}
