//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings and bounds
//! - GET requests to fetch page content
//! - Enforcing the body size limit while streaming
//! - Error classification

use crate::config::{FetchConfig, UserAgentConfig};
use crate::url::normalize_url;
use crate::{FetchError, FetchResult};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// A page that was fetched successfully
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Canonical URL the request ended on after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with the configured bounds
///
/// # Arguments
///
/// * `fetch` - Timeouts and redirect limit
/// * `user_agent` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use sumi_rank::config::{FetchConfig, UserAgentConfig};
/// use sumi_rank::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    fetch: &FetchConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(fetch.connect_timeout_secs))
        .redirect(Policy::limited(fetch.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and classifies the outcome
///
/// # Outcomes
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML content type | `Ok(FetchedPage)` |
/// | Non-2xx status | `Http(code)` |
/// | Other content type | `NotHtml` |
/// | Body larger than `max_body_bytes` | `TooLarge` |
/// | Timeout | `Timeout` |
/// | Connection refused, DNS, TLS | `Connection` |
/// | Redirect limit exceeded | `Redirect` |
pub async fn fetch_url(client: &Client, url: &Url, max_body_bytes: usize) -> FetchResult<FetchedPage> {
    let response = client
        .get(url.clone())
        .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5")
        .send()
        .await
        .map_err(classify_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http(status.as_u16()));
    }

    let final_url = normalize_url(response.url().as_str())
        .map_err(|e| FetchError::Other(format!("Unusable final URL: {}", e)))?;

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return Err(FetchError::NotHtml(content_type));
    }

    let body = read_body(response, max_body_bytes).await?;

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        body,
    })
}

/// Reads the body chunk by chunk, giving up once it passes the limit
async fn read_body(mut response: Response, limit: usize) -> FetchResult<String> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(FetchError::TooLarge { limit });
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(classify_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(FetchError::TooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_redirect() {
        FetchError::Redirect(e.to_string())
    } else if e.is_connect() {
        FetchError::Connection(e.to_string())
    } else {
        FetchError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(timeout_secs: u64) -> Client {
        let fetch = FetchConfig {
            timeout_secs,
            connect_timeout_secs: 1,
            max_redirects: 2,
            max_body_bytes: 1024,
        };
        build_http_client(&fetch, &UserAgentConfig::default()).unwrap()
    }

    fn page(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&FetchConfig::default(), &UserAgentConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("Text/HTML"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("application/json"));
        assert!(!is_html(""));
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><body>hi</body></html>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let fetched = fetch_url(&test_client(5), &page(&server, "/"), 1024)
            .await
            .unwrap();
        assert_eq!(fetched.status_code, 200);
        assert!(fetched.body.contains("hi"));
        assert_eq!(fetched.final_url, page(&server, "/"));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetch_url(&test_client(5), &page(&server, "/missing"), 1024).await;
        assert_eq!(result.unwrap_err(), FetchError::Http(404));
    }

    #[tokio::test]
    async fn test_fetch_not_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{}", "application/json"),
            )
            .mount(&server)
            .await;

        let result = fetch_url(&test_client(5), &page(&server, "/data"), 1024).await;
        assert!(matches!(result.unwrap_err(), FetchError::NotHtml(_)));
    }

    #[tokio::test]
    async fn test_fetch_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("x".repeat(4096), "text/html"),
            )
            .mount(&server)
            .await;

        let result = fetch_url(&test_client(5), &page(&server, "/big"), 1024).await;
        assert_eq!(result.unwrap_err(), FetchError::TooLarge { limit: 1024 });
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html></html>", "text/html")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let result = fetch_url(&test_client(1), &page(&server, "/slow"), 1024).await;
        assert_eq!(result.unwrap_err(), FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_fetch_follows_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old/"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new/", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let fetched = fetch_url(&test_client(5), &page(&server, "/old/"), 1024)
            .await
            .unwrap();
        // The final URL is canonical: no trailing slash
        assert_eq!(fetched.final_url, page(&server, "/new"));
    }

    #[tokio::test]
    async fn test_fetch_redirect_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/loop", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        let result = fetch_url(&test_client(5), &page(&server, "/loop"), 1024).await;
        assert!(matches!(result.unwrap_err(), FetchError::Redirect(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind and drop a listener so the port is very likely closed
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let url = Url::parse(&format!("http://{}/", addr)).unwrap();

        let result = fetch_url(&test_client(5), &url, 1024).await;
        assert!(matches!(result.unwrap_err(), FetchError::Connection(_)));
    }
}
