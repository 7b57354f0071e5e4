//! Query-string encoding for endpoint parameters.
//!
//! # Design
//! Each parameters type lists its query fields in an explicit table of
//! `(external name, extractor)` entries. An extractor returns `None` for an
//! empty value, which keeps the field out of the query. Pairs are sorted by
//! name before encoding so the same parameters always produce the same URL.

use chrono::{DateTime, SecondsFormat, Utc};
use url::form_urlencoded;

use crate::error::{NewsApiError, NewsApiResult};
use crate::types::{
    ArticlesParameters, EverythingParameters, SortBy, SourceParameters, TopHeadlinesParameters,
};

/// Separator for list-valued fields.
pub const LIST_DELIMITER: &str = ",";

/// One query field of a parameters type.
pub struct Field<P: 'static> {
    pub name: &'static str,
    pub value: fn(&P) -> Option<String>,
}

/// A parameters type with a fixed field table.
pub trait QueryParameters: Sized + 'static {
    const FIELDS: &'static [Field<Self>];

    /// Non-empty `(name, value)` pairs in table order.
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        Self::FIELDS
            .iter()
            .filter_map(|field| (field.value)(self).map(|v| (field.name, v)))
            .collect()
    }
}

/// Append the encoded parameters to `base_path`.
///
/// Absent parameters, or parameters whose fields are all empty, leave the
/// path untouched (no trailing `?`).
pub fn encode<P: QueryParameters>(base_path: &str, params: Option<&P>) -> NewsApiResult<String> {
    check_path(base_path)?;
    let Some(params) = params else {
        return Ok(base_path.to_string());
    };

    let mut pairs = params.query_pairs();
    if pairs.is_empty() {
        return Ok(base_path.to_string());
    }
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    Ok(format!("{base_path}?{query}"))
}

fn check_path(path: &str) -> NewsApiResult<()> {
    if path.is_empty() {
        return Err(NewsApiError::Encoding("empty endpoint path".to_string()));
    }
    if path.contains(['?', '#']) {
        return Err(NewsApiError::Encoding(format!(
            "endpoint path {path:?} already has a query or fragment"
        )));
    }
    if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(NewsApiError::Encoding(format!(
            "endpoint path {path:?} contains whitespace or control characters"
        )));
    }
    Ok(())
}

fn text(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn list(values: &[String]) -> Option<String> {
    (!values.is_empty()).then(|| values.join(LIST_DELIMITER))
}

fn number(value: u32) -> Option<String> {
    (value != 0).then(|| value.to_string())
}

fn timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn sort(value: Option<SortBy>) -> Option<String> {
    value.map(|s| s.as_str().to_string())
}

impl QueryParameters for TopHeadlinesParameters {
    const FIELDS: &'static [Field<Self>] = &[
        Field { name: "country", value: |p| text(&p.country) },
        Field { name: "category", value: |p| text(&p.category) },
        Field { name: "sources", value: |p| list(&p.sources) },
        Field { name: "q", value: |p| text(&p.keywords) },
        Field { name: "pageSize", value: |p| number(p.page_size) },
        Field { name: "page", value: |p| number(p.page) },
    ];
}

impl QueryParameters for EverythingParameters {
    const FIELDS: &'static [Field<Self>] = &[
        Field { name: "q", value: |p| text(&p.keywords) },
        Field { name: "searchIn", value: |p| list(&p.search_in) },
        Field { name: "sources", value: |p| list(&p.sources) },
        Field { name: "domains", value: |p| list(&p.domains) },
        Field { name: "excludeDomains", value: |p| list(&p.exclude_domains) },
        Field { name: "from", value: |p| timestamp(p.from) },
        Field { name: "to", value: |p| timestamp(p.to) },
        Field { name: "language", value: |p| text(&p.language) },
        Field { name: "sortBy", value: |p| sort(p.sort_by) },
        Field { name: "pageSize", value: |p| number(p.page_size) },
        Field { name: "page", value: |p| number(p.page) },
    ];
}

impl QueryParameters for SourceParameters {
    const FIELDS: &'static [Field<Self>] = &[
        Field { name: "category", value: |p| text(&p.category) },
        Field { name: "language", value: |p| text(&p.language) },
        Field { name: "country", value: |p| text(&p.country) },
    ];
}

impl QueryParameters for ArticlesParameters {
    const FIELDS: &'static [Field<Self>] = &[
        Field { name: "source", value: |p| text(&p.source) },
        Field { name: "sortBy", value: |p| sort(p.sort_by) },
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(encoded: &str) -> Vec<(String, String)> {
        let (_, query) = encoded.split_once('?').unwrap();
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    #[test]
    fn absent_params_leave_path_unchanged() {
        let out = encode::<TopHeadlinesParameters>("top-headlines", None).unwrap();
        assert_eq!(out, "top-headlines");
    }

    #[test]
    fn empty_params_leave_path_unchanged() {
        assert_eq!(
            encode("top-headlines", Some(&TopHeadlinesParameters::default())).unwrap(),
            "top-headlines"
        );
        assert_eq!(
            encode("everything", Some(&EverythingParameters::default())).unwrap(),
            "everything"
        );
        assert_eq!(encode("sources", Some(&SourceParameters::default())).unwrap(), "sources");
    }

    #[test]
    fn pairs_are_sorted_by_name() {
        let params = TopHeadlinesParameters {
            category: "a".to_string(),
            country: "b".to_string(),
            page: 10,
            ..Default::default()
        };
        assert_eq!(
            encode("top-headlines", Some(&params)).unwrap(),
            "top-headlines?category=a&country=b&page=10"
        );
    }

    #[test]
    fn lists_are_joined_into_one_parameter() {
        let params = EverythingParameters {
            domains: vec!["bbc.co.uk".to_string(), "techcrunch.com".to_string()],
            ..Default::default()
        };
        let out = encode("everything", Some(&params)).unwrap();
        assert_eq!(out, "everything?domains=bbc.co.uk%2Ctechcrunch.com");

        let pairs = parse(&out);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0], ("domains".to_string(), "bbc.co.uk,techcrunch.com".to_string()));
    }

    #[test]
    fn timestamps_use_rfc3339_utc() {
        let params = EverythingParameters {
            keywords: "rust".to_string(),
            from: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ..Default::default()
        };
        let pairs = parse(&encode("everything", Some(&params)).unwrap());
        assert_eq!(
            pairs,
            vec![
                ("from".to_string(), "2024-01-02T03:04:05Z".to_string()),
                ("q".to_string(), "rust".to_string()),
            ]
        );
    }

    #[test]
    fn values_are_percent_encoded_and_recoverable() {
        let params = EverythingParameters {
            keywords: "bitcoin & ethereum".to_string(),
            sort_by: Some(SortBy::PublishedAt),
            page_size: 20,
            language: "en".to_string(),
            ..Default::default()
        };
        let out = encode("everything", Some(&params)).unwrap();
        assert!(out.contains("q=bitcoin+%26+ethereum"));

        let pairs = parse(&out);
        assert_eq!(
            pairs,
            vec![
                ("language".to_string(), "en".to_string()),
                ("pageSize".to_string(), "20".to_string()),
                ("q".to_string(), "bitcoin & ethereum".to_string()),
                ("sortBy".to_string(), "publishedAt".to_string()),
            ]
        );
    }

    #[test]
    fn uses_external_names() {
        let params = EverythingParameters {
            exclude_domains: vec!["example.com".to_string()],
            search_in: vec!["title".to_string(), "content".to_string()],
            ..Default::default()
        };
        let names: Vec<String> = parse(&encode("everything", Some(&params)).unwrap())
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(names, vec!["excludeDomains", "searchIn"]);
    }

    #[test]
    fn legacy_articles_fields() {
        let params = ArticlesParameters {
            source: "the-verge".to_string(),
            sort_by: Some(SortBy::Latest),
        };
        assert_eq!(
            encode("articles", Some(&params)).unwrap(),
            "articles?sortBy=latest&source=the-verge"
        );
    }

    #[test]
    fn bad_paths_fail_with_encoding_error() {
        let params = SourceParameters {
            language: "en".to_string(),
            ..Default::default()
        };
        for path in ["", "sources?x=1", "sources#frag", "sour ces", "sources\n"] {
            let err = encode(path, Some(&params)).unwrap_err();
            assert!(matches!(err, NewsApiError::Encoding(_)), "{path:?}");
        }
    }

    #[test]
    fn bad_paths_fail_without_params() {
        for path in ["", "sources?x=1", "sources#frag", "sour ces"] {
            let err = encode::<SourceParameters>(path, None).unwrap_err();
            assert!(matches!(err, NewsApiError::Encoding(_)), "{path:?}");
        }
    }
}
