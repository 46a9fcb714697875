use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{configuration::SerperSettings, domain::search_result::SearchResult};

/// What came back for one page of one query.
#[derive(Debug, PartialEq)]
pub enum PageOutcome {
    /// Parsed page. Holds only the usable entries, so it can be empty.
    Organic(Vec<SearchResult>),
    /// `organic` missing or empty: no more pages.
    Exhausted,
    Rejected(StatusCode),
    Unreachable,
    Unparseable,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn fetch_page(&self, query: &str, page: i32) -> PageOutcome;
}

#[derive(Serialize)]
struct SerperQuery<'a> {
    q: &'a str,
    page: i32,
}

#[derive(Deserialize)]
struct SerperResponse {
    organic: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
    position: Option<u32>,
}

pub struct SerperClient {
    client: Client,
    api_key: String,
    url: Url,
}

impl SerperClient {
    pub fn new(settings: &SerperSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(SerperClient::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &SerperSettings) -> Self {
        SerperClient {
            client,
            api_key: settings.api_key.clone(),
            url: settings.endpoint.clone(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn fetch_page(&self, query: &str, page: i32) -> PageOutcome {
        let res = match self
            .client
            .post(self.url.clone())
            .header("X-API-KEY", &self.api_key)
            .json(&SerperQuery { q: query, page })
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                log::error!(
                    "Failed to execute request to Serper for query '{}' page {}: {:?}",
                    query,
                    page,
                    e
                );
                return PageOutcome::Unreachable;
            }
        };

        let status = res.status();
        if status != StatusCode::OK {
            log::error!(
                "Failed to fetch page {} from Serper for query '{}'. HTTP status: {}",
                page,
                query,
                status
            );
            return PageOutcome::Rejected(status);
        }

        match res.text().await {
            Ok(body) => parse_page(query, page, &body),
            Err(e) => {
                log::error!(
                    "Failed to read Serper response body for query '{}' page {}: {:?}",
                    query,
                    page,
                    e
                );
                PageOutcome::Unreachable
            }
        }
    }
}

pub fn parse_page(query: &str, page: i32, body: &str) -> PageOutcome {
    let response = match serde_json::from_str::<SerperResponse>(body) {
        Ok(response) => response,
        Err(e) => {
            log::warn!(
                "Empty or unparseable Serper response for query '{}' page {}: {:?}",
                query,
                page,
                e
            );
            return PageOutcome::Unparseable;
        }
    };

    let organic = match response.organic {
        Some(organic) if !organic.is_empty() => organic,
        _ => {
            log::info!(
                "No more organic results for query '{}' after page {}.",
                query,
                page
            );
            return PageOutcome::Exhausted;
        }
    };

    let results = organic
        .into_iter()
        .filter_map(|entry| to_search_result(query, page, entry))
        .collect();

    PageOutcome::Organic(results)
}

fn to_search_result(query: &str, page: i32, entry: serde_json::Value) -> Option<SearchResult> {
    let organic = match serde_json::from_value::<Option<OrganicResult>>(entry) {
        Ok(Some(organic)) => organic,
        Ok(None) => {
            log::debug!("Skipping null organic entry on page {}", page);
            return None;
        }
        Err(e) => {
            log::debug!("Skipping malformed organic entry on page {}: {:?}", page, e);
            return None;
        }
    };

    let position = match organic.position.map(i32::try_from) {
        None => 0,
        Some(Ok(position)) => position,
        Some(Err(_)) => {
            log::debug!("Skipping organic entry with out of range position on page {}", page);
            return None;
        }
    };

    SearchResult::new(
        organic.snippet,
        organic.link,
        page,
        position,
        query,
        organic.title,
    )
    .map_err(|e| log::debug!("Skipping organic entry on page {}: {}", page, e))
    .ok()
}

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::{parse_page, PageOutcome, SearchProvider, SerperClient};
    use crate::configuration::SerperSettings;

    fn client(endpoint: &str) -> SerperClient {
        let http = Client::builder().no_proxy().build().unwrap();
        SerperClient::with_client(http, &settings(endpoint))
    }

    fn settings(endpoint: &str) -> SerperSettings {
        SerperSettings {
            endpoint: endpoint.parse().unwrap(),
            api_key: "secret-key".to_string(),
            connect_timeout_secs: 60,
            timeout_secs: 5,
            max_pages: 50,
        }
    }

    /// Serves one canned response and hands back the raw request it received.
    async fn serve_once(
        status_line: &str,
        body: &str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&received).to_string()
        });

        (format!("http://{}/search", addr), handle)
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        received.len() >= header_end + 4 + content_length
    }

    #[test]
    fn maps_organic_entries_with_defaults() {
        let body = r#"{
            "searchParameters": {"q": "cats"},
            "organic": [
                {"title": "Cat", "link": "https://en.wikipedia.org/wiki/Cat", "snippet": "The cat", "position": 1},
                {"link": "https://cats.com", "position": 2},
                {"title": "No rank"}
            ]
        }"#;

        let PageOutcome::Organic(results) = parse_page("cats", 3, body) else {
            panic!("expected organic results");
        };

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title(), "Cat");
        assert_eq!(results[0].description(), "The cat");
        assert_eq!(results[0].position(), 1);
        assert_eq!(results[0].page_number(), 3);
        assert_eq!(results[1].title(), "");
        assert_eq!(results[1].description(), "");
        assert_eq!(results[1].link(), "https://cats.com");
        assert_eq!(results[2].position(), 0);
        assert_eq!(results[2].link(), "");
        assert!(results.iter().all(|r| r.query() == "cats"));
    }

    #[test]
    fn null_and_malformed_entries_are_skipped() {
        let body = r#"{"organic": [
            null,
            {"title": "Good", "position": 1},
            {"title": 42},
            "not an object",
            {"title": "Negative", "position": -3},
            {"title": "Also good", "position": 2}
        ]}"#;

        let PageOutcome::Organic(results) = parse_page("cats", 1, body) else {
            panic!("expected organic results");
        };

        let titles: Vec<&str> = results.iter().map(|r| r.title()).collect();
        assert_eq!(titles, vec!["Good", "Also good"]);
    }

    #[test]
    fn page_with_only_broken_entries_is_empty() {
        let outcome = parse_page("cats", 1, r#"{"organic": [null, 7]}"#);

        assert_eq!(outcome, PageOutcome::Organic(vec![]));
    }

    #[test]
    fn missing_or_empty_organic_is_exhausted() {
        assert_eq!(parse_page("cats", 2, r#"{"organic": []}"#), PageOutcome::Exhausted);
        assert_eq!(parse_page("cats", 2, r#"{"organic": null}"#), PageOutcome::Exhausted);
        assert_eq!(
            parse_page("cats", 2, r#"{"knowledgeGraph": {}}"#),
            PageOutcome::Exhausted
        );
    }

    #[test]
    fn unparseable_body() {
        assert_eq!(parse_page("cats", 1, ""), PageOutcome::Unparseable);
        assert_eq!(parse_page("cats", 1, "null"), PageOutcome::Unparseable);
        assert_eq!(parse_page("cats", 1, "<html>"), PageOutcome::Unparseable);
    }

    #[tokio::test]
    async fn sends_query_page_and_api_key() {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"organic": [{"title": "Cat", "position": 1}]}"#).await;
        let client = client(&endpoint);

        let outcome = client.fetch_page("cats", 2).await;
        let request = server.await.unwrap();

        let PageOutcome::Organic(results) = outcome else {
            panic!("expected organic results");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].page_number(), 2);
        assert!(request.starts_with("POST /search"));
        assert!(request.to_lowercase().contains("x-api-key: secret-key"));
        assert!(request.contains(r#""q":"cats""#));
        assert!(request.contains(r#""page":2"#));
    }

    #[tokio::test]
    async fn non_200_status_is_rejected() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "{}").await;
        let client = client(&endpoint);

        let outcome = client.fetch_page("cats", 1).await;
        server.await.unwrap();

        assert_eq!(outcome, PageOutcome::Rejected(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn transport_failure_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client(&format!("http://{}/search", addr));

        let outcome = client.fetch_page("cats", 1).await;

        assert_eq!(outcome, PageOutcome::Unreachable);
    }
}
