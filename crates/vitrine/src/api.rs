//! REST API client fixture.
//!
//! Tests against public JSON APIs share the runner, the fixture registry and
//! the soft assertions with the browser tests; [`ApiClient`] gives them a
//! response record with status, headers, body and latency.

use crate::result::{VitrineError, VitrineResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Default request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to one base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Client for `base_url` with the default timeout
    pub fn new(base_url: impl Into<String>) -> VitrineResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client for `base_url` with a request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> VitrineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| VitrineError::api(format!("cannot build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a path; absolute inputs pass through
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// GET a path
    pub async fn get(&self, path: &str) -> VitrineResult<ApiResponse> {
        self.get_with_query(path, &[]).await
    }

    /// GET a path with URL-encoded query parameters
    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> VitrineResult<ApiResponse> {
        let url = self.url(path);
        let start = Instant::now();
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|err| VitrineError::api(format!("GET {url}: {err}")))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|err| VitrineError::api(format!("GET {url}: reading body: {err}")))?;
        let elapsed = start.elapsed();
        tracing::debug!(%url, status, elapsed_ms = elapsed.as_millis() as u64, "api request");

        Ok(ApiResponse {
            status,
            headers,
            body,
            elapsed,
        })
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Status code
    pub status: u16,
    /// Headers, names lower-cased
    pub headers: BTreeMap<String, String>,
    /// Body text
    pub body: String,
    /// Time from send until the body was read
    pub elapsed: Duration,
}

impl ApiResponse {
    /// Status is 2xx
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Header value, case-insensitive
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `Content-Type` header, empty when absent
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or_default()
    }

    /// Deserialize the body
    pub fn json<T: DeserializeOwned>(&self) -> VitrineResult<T> {
        serde_json::from_str(&self.body).map_err(|err| {
            VitrineError::api(format!("status {} body is not the expected JSON: {err}", self.status))
        })
    }

    /// Body as an untyped JSON value
    pub fn json_value(&self) -> VitrineResult<serde_json::Value> {
        self.json()
    }
}

/// One fact from the Cat Fact API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatFact {
    /// Fact text
    pub fact: String,
    /// Length of `fact` as reported by the API
    pub length: usize,
}

/// A page of `/facts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatFactPage {
    /// One-based page number
    pub current_page: u32,
    /// Facts on this page
    pub data: Vec<CatFact>,
    /// Page size
    pub per_page: usize,
    /// Facts across all pages
    pub total: usize,
    /// Number of the last page
    pub last_page: u32,
    /// Link to the previous page
    pub prev_page_url: Option<String>,
    /// Link to the next page
    pub next_page_url: Option<String>,
}

/// A Hogwarts house from the Wizard World API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct House {
    /// UUID
    pub id: String,
    /// Name
    pub name: String,
    /// Colours as one string
    #[serde(default)]
    pub house_colours: Option<String>,
    /// Founder
    #[serde(default)]
    pub founder: Option<String>,
    /// Animal
    #[serde(default)]
    pub animal: Option<String>,
    /// Element
    #[serde(default)]
    pub element: Option<String>,
    /// Ghost
    #[serde(default)]
    pub ghost: Option<String>,
    /// Common room
    #[serde(default)]
    pub common_room: Option<String>,
}

/// An elixir or spell; only the fields the suites inspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedEntry {
    /// UUID
    pub id: String,
    /// Name
    pub name: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned response per connection and return the base URL
    async fn serve(status: &'static str, content_type: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}")
    }

    mod client_tests {
        use super::*;

        #[test]
        fn test_url_joining() {
            let client = ApiClient::new("https://catfact.ninja/").unwrap();
            assert_eq!(client.base_url(), "https://catfact.ninja");
            assert_eq!(client.url("/fact"), "https://catfact.ninja/fact");
            assert_eq!(client.url("facts"), "https://catfact.ninja/facts");
            assert_eq!(client.url("https://other.example/x"), "https://other.example/x");
        }

        #[tokio::test]
        async fn test_get_reads_status_headers_and_json() {
            let base = serve(
                "200 OK",
                "application/json",
                r#"{"fact":"Cats sleep a lot.","length":17}"#,
            )
            .await;
            let client = ApiClient::new(base).unwrap();
            let response = client.get("/fact").await.unwrap();
            assert!(response.is_ok());
            assert_eq!(response.status, 200);
            assert!(response.content_type().contains("application/json"));
            assert_eq!(response.header("Content-Type"), response.header("content-type"));

            let fact: CatFact = response.json().unwrap();
            assert_eq!(fact.length, fact.fact.len());
        }

        #[tokio::test]
        async fn test_server_error_is_a_response_not_an_error() {
            let base = serve("500 Internal Server Error", "text/plain", "boom").await;
            let response = ApiClient::new(base).unwrap().get("/Elixirs/x").await.unwrap();
            assert_eq!(response.status, 500);
            assert!(!response.is_ok());
            assert!(matches!(
                response.json::<CatFact>().unwrap_err(),
                VitrineError::Api { .. }
            ));
        }

        #[tokio::test]
        async fn test_unreachable_host_is_api_error() {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);
            let client =
                ApiClient::with_timeout(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
            let err = client.get("/fact").await.unwrap_err();
            assert!(matches!(err, VitrineError::Api { .. }));
        }
    }

    mod model_tests {
        use super::*;

        #[test]
        fn test_house_camel_case() {
            let house: House = serde_json::from_str(
                r#"{"id":"1","name":"Slytherin","houseColours":"Green and silver","commonRoom":"Dungeons"}"#,
            )
            .unwrap();
            assert_eq!(house.house_colours.as_deref(), Some("Green and silver"));
            assert_eq!(house.common_room.as_deref(), Some("Dungeons"));
            assert!(house.ghost.is_none());
        }

        #[test]
        fn test_first_page_has_no_prev() {
            let page: CatFactPage = serde_json::from_str(
                r#"{"current_page":1,"data":[],"per_page":10,"total":332,"last_page":34,
                    "prev_page_url":null,"next_page_url":"https://catfact.ninja/facts?page=2"}"#,
            )
            .unwrap();
            assert!(page.prev_page_url.is_none());
            assert!(page.next_page_url.is_some());
        }
    }
}
