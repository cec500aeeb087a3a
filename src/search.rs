//! Keyword search against the Tavily API, used as a context source for SEO content.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::environment::get_env_var_or;
use crate::error::{GeneratorError, Result};
use crate::web::create_http_client;
use crate::TARGET_SEARCH_REQUEST;

pub const TAVILY_API_BASE: &str = "https://api.tavily.com";

/// A retrieved document; `content` is what gets fed into the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: String,
    pub title: Option<String>,
    pub content: String,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to the configured number of documents for `query`, best match first.
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    url: String,
    title: Option<String>,
    #[serde(default)]
    content: String,
    raw_content: Option<String>,
}

/// Tavily search client returning full page content for each hit.
#[derive(Clone)]
pub struct TavilyRetriever {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    max_results: usize,
}

impl std::fmt::Debug for TavilyRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyRetriever")
            .field("api_base", &self.api_base)
            .field("max_results", &self.max_results)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl TavilyRetriever {
    pub fn new(api_key: String, max_results: usize) -> Result<Self> {
        Self::with_api_base(api_key, max_results, get_env_var_or("TAVILY_API_BASE", TAVILY_API_BASE))
    }

    pub fn with_api_base(api_key: String, max_results: usize, api_base: String) -> Result<Self> {
        Ok(Self {
            client: create_http_client()?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            max_results,
        })
    }

    /// Builds a retriever when a Tavily key is available.
    ///
    /// Without one, search is reported as disabled and `None` is returned.
    pub fn from_credential(api_key: Option<&str>, max_results: usize) -> Result<Option<Self>> {
        match api_key {
            Some(key) => Ok(Some(Self::new(key.to_string(), max_results)?)),
            None => {
                warn!(target: TARGET_SEARCH_REQUEST, "Tavily API key not set. Search results are disabled.");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Retriever for TavilyRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let url = format!("{}/search", self.api_base);
        let body = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
            search_depth: "basic",
            include_answer: false,
            include_raw_content: true,
            include_images: false,
        };

        info!(target: TARGET_SEARCH_REQUEST, "Searching for '{}' (k = {})", query, self.max_results);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(target: TARGET_SEARCH_REQUEST, "Search returned status {}: {}", status, detail);
            return Err(GeneratorError::Search(format!("status {}: {}", status, detail.trim())));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Search(format!("malformed response: {}", e)))?;

        let documents: Vec<Document> = parsed
            .results
            .into_iter()
            .take(self.max_results)
            .map(|result| Document {
                content: result
                    .raw_content
                    .filter(|raw| !raw.trim().is_empty())
                    .unwrap_or(result.content),
                source: result.url,
                title: result.title,
            })
            .collect();

        debug!(target: TARGET_SEARCH_REQUEST, "Search for '{}' returned {} documents", query, documents.len());
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_retrieve_prefers_raw_content_and_keeps_rank_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_header("authorization", "Bearer tvly-test")
            .match_body(Matcher::PartialJson(json!({
                "query": "Arda Güler kimdir",
                "max_results": 2,
                "include_raw_content": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "query": "Arda Güler kimdir",
                    "results": [
                        {"url": "https://a.example", "title": "A", "content": "snippet a", "raw_content": "full a"},
                        {"url": "https://b.example", "title": "B", "content": "snippet b", "raw_content": null}
                    ]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let retriever =
            TavilyRetriever::with_api_base("tvly-test".to_string(), 2, server.url()).unwrap();
        let documents = retriever.retrieve("Arda Güler kimdir").await.unwrap();

        mock.assert_async().await;
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].content, "full a");
        assert_eq!(documents[0].source, "https://a.example");
        assert_eq!(documents[1].content, "snippet b");
    }

    #[tokio::test]
    async fn test_retrieve_reports_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/search")
            .with_status(401)
            .with_body(r#"{"detail": {"error": "Unauthorized"}}"#)
            .create_async()
            .await;

        let retriever =
            TavilyRetriever::with_api_base("bad-key".to_string(), 2, server.url()).unwrap();
        let err = retriever.retrieve("topic").await.unwrap_err();
        assert!(matches!(err, GeneratorError::Search(ref msg) if msg.contains("401")));
    }

    #[test]
    fn test_missing_credential_disables_search() {
        assert!(TavilyRetriever::from_credential(None, 2).unwrap().is_none());
    }
}
