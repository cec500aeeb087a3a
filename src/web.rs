//! Web page loading and readable-text extraction for the URL context source.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use readability::extractor;
use reqwest::{cookie::Jar, header};
use tokio::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{GeneratorError, Result};
use crate::TARGET_WEB_REQUEST;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[async_trait]
pub trait PageLoader: Send + Sync {
    /// Fetches `url` and returns the readable text of the page.
    async fn load(&self, url: &str) -> Result<String>;
}

/// Create the HTTP client shared by page loading and search.
pub fn create_http_client() -> Result<reqwest::Client> {
    let cookie_store = Jar::default();
    reqwest::Client::builder()
        .cookie_store(true)
        .cookie_provider(Arc::new(cookie_store))
        .gzip(true)
        .redirect(reqwest::redirect::Policy::default())
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| GeneratorError::HttpClient(e.to_string()))
}

/// Parses `raw` as an absolute http(s) URL.
pub fn parse_page_url(raw: &str) -> Result<Url> {
    let parsed = Url::parse(raw).map_err(|e| GeneratorError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(GeneratorError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{}`", other),
        }),
    }
}

/// Runs readability over `html` and returns the article text.
pub fn extract_article_text(html: &str, url: &Url) -> Result<String> {
    let mut reader = Cursor::new(html.as_bytes());
    let product = extractor::extract(&mut reader, url).map_err(|e| GeneratorError::Fetch {
        url: url.to_string(),
        reason: format!("could not extract readable text: {:?}", e),
    })?;

    let text = product.text.trim();
    if text.is_empty() {
        warn!(target: TARGET_WEB_REQUEST, "Extracted article is empty for URL: {}", url);
        return Err(GeneratorError::Fetch {
            url: url.to_string(),
            reason: "page has no readable text".to_string(),
        });
    }
    debug!(target: TARGET_WEB_REQUEST, "Extracted '{}' ({} chars) from {}", product.title, text.len(), url);
    Ok(text.to_string())
}

/// Loads pages over HTTP and extracts their main text.
#[derive(Debug, Clone)]
pub struct WebPageLoader {
    client: reqwest::Client,
}

impl WebPageLoader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: create_http_client()?,
        })
    }
}

#[async_trait]
impl PageLoader for WebPageLoader {
    async fn load(&self, url: &str) -> Result<String> {
        let parsed = parse_page_url(url)?;
        info!(target: TARGET_WEB_REQUEST, "Loading page {}", parsed);

        let response = self
            .client
            .get(parsed.clone())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| GeneratorError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: TARGET_WEB_REQUEST, "Non-success status {} from {}", status, url);
            return Err(GeneratorError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP status {}", status),
            });
        }

        // Redirects may land on a different page; relative links resolve against the final URL.
        let final_url = response.url().clone();
        let html = response.text().await.map_err(|e| GeneratorError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        extract_article_text(&html, &final_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Deprem haberi</title></head>
<body>
  <nav><a href="/">Anasayfa</a></nav>
  <div id="content">
    <article>
      <h1>Deprem haberi</h1>
      <p>Sabah saatlerinde meydana gelen deprem, bölgedeki vatandaşları sokağa döktü, yetkililer hasar tespit çalışmalarının sürdüğünü açıkladı.</p>
      <p>Valilik tarafından yapılan açıklamada, şu ana kadar can kaybı olmadığı, ancak bazı binalarda hafif çatlaklar tespit edildiği belirtildi.</p>
      <p>Uzmanlar, artçı sarsıntıların birkaç gün daha sürebileceğini, vatandaşların hasarlı binalara girmemesi gerektiğini vurguladı.</p>
    </article>
  </div>
</body>
</html>"#;

    #[test]
    fn test_parse_page_url() {
        assert!(parse_page_url("https://example.com/haber/1").is_ok());
        assert!(matches!(
            parse_page_url("example.com/haber"),
            Err(GeneratorError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_page_url("ftp://example.com/file"),
            Err(GeneratorError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_extract_article_text() {
        let url = Url::parse("https://example.com/deprem").unwrap();
        let text = extract_article_text(ARTICLE_HTML, &url).unwrap();
        assert!(text.contains("can kaybı olmadığı"));
    }

    #[tokio::test]
    async fn test_load_page() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/deprem")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(ARTICLE_HTML)
            .create_async()
            .await;

        let loader = WebPageLoader::new().unwrap();
        let text = loader
            .load(&format!("{}/deprem", server.url()))
            .await
            .unwrap();
        assert!(text.contains("artçı sarsıntıların"));
    }

    #[tokio::test]
    async fn test_load_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let loader = WebPageLoader::new().unwrap();
        let err = loader
            .load(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Fetch { ref reason, .. } if reason.contains("404")));
    }
}
