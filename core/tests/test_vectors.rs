//! Verify the request pipeline against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes endpoint inputs, the expected outgoing request,
//! a simulated response and the expected result or error. A stub transport
//! records the request and replays the simulated response. Results are
//! compared as parsed values, not raw strings.

use std::sync::{Arc, Mutex};

use newsapi_core::{
    ArticlesResponse, CancellationToken, EverythingParameters, HttpMethod, HttpRequest,
    HttpResponse, NewsApiError, NewsApiResult, NewsClient, SortBy, SourceParameters,
    SourcesResponse, TopHeadlinesParameters, Transport, TransportError,
};
use serde_json::Value;

const BASE_URL: &str = "https://newsapi.example/v2";
const API_KEY: &str = "vector-key";

struct ReplayTransport {
    response: HttpResponse,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

impl Transport for ReplayTransport {
    fn send(
        &self,
        request: &HttpRequest,
        _cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

/// Build a client that replays the case's simulated response.
fn client_for(case: &Value) -> (NewsClient, Arc<Mutex<Vec<HttpRequest>>>) {
    let sim = &case["simulated_response"];
    let sent = Arc::new(Mutex::new(Vec::new()));
    let transport = ReplayTransport {
        response: HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        },
        sent: Arc::clone(&sent),
    };
    let client = NewsClient::builder(API_KEY)
        .base_url(BASE_URL)
        .transport(transport)
        .build()
        .unwrap();
    (client, sent)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        other => panic!("unknown method: {other}"),
    }
}

fn string(input: &Value, key: &str) -> String {
    input[key].as_str().unwrap_or_default().to_string()
}

fn strings(input: &Value, key: &str) -> Vec<String> {
    input[key]
        .as_array()
        .map(|a| a.iter().map(|v| v.as_str().unwrap().to_string()).collect())
        .unwrap_or_default()
}

fn number(input: &Value, key: &str) -> u32 {
    input[key].as_u64().unwrap_or_default() as u32
}

fn check_request(name: &str, case: &Value, sent: &Arc<Mutex<Vec<HttpRequest>>>) {
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "{name}: exactly one request");
    let req = &sent[0];
    let expected = &case["expected_request"];

    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(
        req.url,
        format!("{BASE_URL}{}", expected["path"].as_str().unwrap()),
        "{name}: url"
    );

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");
}

fn check_outcome<T>(name: &str, case: &Value, result: NewsApiResult<T>)
where
    T: serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    if let Some(expected_error) = case.get("expected_error") {
        let err = result.unwrap_err();
        match expected_error["kind"].as_str().unwrap() {
            "Api" => match err {
                NewsApiError::Api { status, code, message } => {
                    assert_eq!(u64::from(status), expected_error["status"].as_u64().unwrap(), "{name}: status");
                    assert_eq!(code, expected_error["code"].as_str().unwrap(), "{name}: code");
                    assert_eq!(message, expected_error["message"].as_str().unwrap(), "{name}: message");
                }
                other => panic!("{name}: expected Api error, got {other:?}"),
            },
            "Decode" => assert!(matches!(err, NewsApiError::Decode(_)), "{name}: expected Decode"),
            other => panic!("{name}: unknown expected_error: {other}"),
        }
    } else {
        let value = result.unwrap();
        let expected: T = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(value, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Top headlines
// ---------------------------------------------------------------------------

#[test]
fn top_headlines_test_vectors() {
    let raw = include_str!("../../test-vectors/top_headlines.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let params = TopHeadlinesParameters {
            country: string(input, "country"),
            category: string(input, "category"),
            sources: strings(input, "sources"),
            keywords: string(input, "q"),
            page_size: number(input, "pageSize"),
            page: number(input, "page"),
        };

        let (client, sent) = client_for(case);
        let result = client.top_headlines(&CancellationToken::new(), Some(&params));
        check_request(name, case, &sent);
        check_outcome::<ArticlesResponse>(name, case, result);
    }
}

// ---------------------------------------------------------------------------
// Everything
// ---------------------------------------------------------------------------

#[test]
fn everything_test_vectors() {
    let raw = include_str!("../../test-vectors/everything.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let params = EverythingParameters {
            keywords: string(input, "q"),
            search_in: strings(input, "searchIn"),
            sources: strings(input, "sources"),
            domains: strings(input, "domains"),
            exclude_domains: strings(input, "excludeDomains"),
            from: input.get("from").map(|v| serde_json::from_value(v.clone()).unwrap()),
            to: input.get("to").map(|v| serde_json::from_value(v.clone()).unwrap()),
            language: string(input, "language"),
            sort_by: input
                .get("sortBy")
                .map(|v| serde_json::from_value::<SortBy>(v.clone()).unwrap()),
            page_size: number(input, "pageSize"),
            page: number(input, "page"),
        };

        let (client, sent) = client_for(case);
        let result = client.everything(&CancellationToken::new(), Some(&params));
        check_request(name, case, &sent);
        check_outcome::<ArticlesResponse>(name, case, result);
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[test]
fn sources_test_vectors() {
    let raw = include_str!("../../test-vectors/sources.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let params = SourceParameters {
            category: string(input, "category"),
            language: string(input, "language"),
            country: string(input, "country"),
        };

        let (client, sent) = client_for(case);
        let result = client.sources(&CancellationToken::new(), Some(&params));
        check_request(name, case, &sent);
        check_outcome::<SourcesResponse>(name, case, result);
    }
}
