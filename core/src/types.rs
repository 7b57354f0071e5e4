//! Domain DTOs for the news API.
//!
//! # Design
//! Parameter structs are plain values with every field optional: an empty
//! string, an empty list, zero or `None` means "leave it out of the query".
//! Their query names live in the field tables in `query.rs`, not in serde
//! attributes, so these types carry no wire mapping of their own.
//!
//! Payload types mirror the remote JSON. Every field defaults when missing or
//! `null`, so an empty body decodes to the zero value and a null string field
//! decodes to `""` instead of failing the whole response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result ordering accepted by the `everything` and legacy `articles`
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevancy,
    Popularity,
    PublishedAt,
    /// Legacy `articles` ordering.
    Top,
    /// Legacy `articles` ordering.
    Latest,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
            SortBy::PublishedAt => "publishedAt",
            SortBy::Top => "top",
            SortBy::Latest => "latest",
        }
    }
}

/// Parameters for `top-headlines`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopHeadlinesParameters {
    pub country: String,
    pub category: String,
    /// Source identifiers. Cannot be mixed with `country` or `category` on
    /// the remote side.
    pub sources: Vec<String>,
    /// Sent as `q`.
    pub keywords: String,
    pub page_size: u32,
    pub page: u32,
}

/// Parameters for `everything`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EverythingParameters {
    /// Sent as `q`.
    pub keywords: String,
    /// Fields to restrict the keyword search to: `title`, `description`,
    /// `content`.
    pub search_in: Vec<String>,
    pub sources: Vec<String>,
    pub domains: Vec<String>,
    pub exclude_domains: Vec<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub language: String,
    pub sort_by: Option<SortBy>,
    pub page_size: u32,
    pub page: u32,
}

/// Parameters for `sources`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceParameters {
    pub category: String,
    pub language: String,
    pub country: String,
}

/// Parameters for the legacy single-source `articles` endpoint. `source` is
/// mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlesParameters {
    pub source: String,
    pub sort_by: Option<SortBy>,
}

/// Source reference embedded in an article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: ArticleSource,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A news publisher as listed by the `sources` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
}

/// Success payload of `top-headlines`, `everything` and `articles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_results: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub articles: Vec<Article>,
}

/// Success payload of `sources`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<Source>,
}
