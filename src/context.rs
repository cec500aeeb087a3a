//! Resolution of the context blob from search results, pasted text or a list of URLs.

use std::fmt;

use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::search::Retriever;
use crate::web::PageLoader;
use crate::TARGET_PIPELINE;

/// Placed between documents when several are flattened into one blob.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Separates entries of a pasted URL list.
pub const URL_DELIMITER: char = ',';

/// Where the context for a run comes from, with the user input for that source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSource {
    /// Web search for the run's topic.
    Search,
    Manual { text: String },
    Urls { list: String },
}

/// The source choices offered on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContextSourceKind {
    Search,
    Manual,
    Urls,
}

impl ContextSource {
    pub fn kind(&self) -> ContextSourceKind {
        match self {
            ContextSource::Search => ContextSourceKind::Search,
            ContextSource::Manual { .. } => ContextSourceKind::Manual,
            ContextSource::Urls { .. } => ContextSourceKind::Urls,
        }
    }
}

impl ContextSourceKind {
    pub fn name(self) -> &'static str {
        match self {
            ContextSourceKind::Search => "search",
            ContextSourceKind::Manual => "manual",
            ContextSourceKind::Urls => "urls",
        }
    }
}

impl fmt::Display for ContextSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A URL that could not be turned into context, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub url: String,
    pub reason: String,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.reason)
    }
}

/// The flattened context text plus any per-URL failures met while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBlob {
    pub text: String,
    pub failures: Vec<SourceFailure>,
}

impl ContextBlob {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failures: Vec::new(),
        }
    }

    /// A blob with no usable text; generation is suppressed for it.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Joins document bodies with a blank line, keeping their order.
pub fn join_documents<I, S>(documents: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    documents
        .into_iter()
        .map(|doc| doc.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Splits a pasted URL list on commas, trimming entries and dropping blank ones.
pub fn split_url_list(raw: &str) -> Vec<String> {
    raw.split(URL_DELIMITER)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pasted context is used as typed, minus surrounding whitespace.
pub fn resolve_manual(text: &str) -> ContextBlob {
    ContextBlob::from_text(text.trim())
}

/// Searches for `topic` and joins the documents in rank order.
///
/// A blank topic issues no request and yields an empty blob.
pub async fn resolve_search<R: Retriever + ?Sized>(retriever: &R, topic: &str) -> Result<ContextBlob> {
    let topic = topic.trim();
    if topic.is_empty() {
        debug!(target: TARGET_PIPELINE, "Blank topic, skipping search");
        return Ok(ContextBlob::default());
    }
    let documents = retriever.retrieve(topic).await?;
    info!(target: TARGET_PIPELINE, "Search returned {} documents for '{}'", documents.len(), topic);
    Ok(ContextBlob::from_text(join_documents(
        documents.iter().map(|doc| doc.content.as_str()),
    )))
}

/// Loads every URL in the list one after another and joins the page texts in list order.
///
/// A URL that is malformed or fails to load is recorded in `failures` and skipped; the
/// remaining pages still make up the blob.
pub async fn resolve_urls<L: PageLoader + ?Sized>(loader: &L, raw: &str) -> ContextBlob {
    let urls = split_url_list(raw);
    if urls.is_empty() {
        debug!(target: TARGET_PIPELINE, "URL list is empty, nothing to fetch");
        return ContextBlob::default();
    }

    let mut pages = Vec::with_capacity(urls.len());
    let mut failures = Vec::new();
    for url in urls {
        match loader.load(&url).await {
            Ok(text) => pages.push(text),
            Err(e) => {
                warn!(target: TARGET_PIPELINE, "Skipping {}: {}", url, e);
                failures.push(SourceFailure {
                    url,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(target: TARGET_PIPELINE, "Loaded {} pages, {} failed", pages.len(), failures.len());
    ContextBlob {
        text: join_documents(&pages),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use crate::search::Document;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeLoader {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeLoader {
        fn with_pages(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, text)| (url.to_string(), text.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageLoader for FakeLoader {
        async fn load(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| GeneratorError::Fetch {
                    url: url.to_string(),
                    reason: "HTTP status 404 Not Found".to_string(),
                })
        }
    }

    struct FakeRetriever {
        documents: Vec<&'static str>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Retriever for FakeRetriever {
        async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self
                .documents
                .iter()
                .enumerate()
                .map(|(i, content)| Document {
                    source: format!("https://example.com/{}", i),
                    title: None,
                    content: content.to_string(),
                })
                .collect())
        }
    }

    #[test]
    fn test_split_url_list() {
        assert_eq!(
            split_url_list(" https://a.example , https://b.example,,\n"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(split_url_list("").is_empty());
        assert!(split_url_list(" ,  ").is_empty());
    }

    #[test]
    fn test_manual_context_is_trimmed_only() {
        let blob = resolve_manual("  Test haberi.\n\n  İkinci satır {context}  \n");
        assert_eq!(blob.text, "Test haberi.\n\n  İkinci satır {context}");
        assert!(resolve_manual(" \n\t ").is_empty());
    }

    #[tokio::test]
    async fn test_urls_joined_in_input_order() {
        let loader = FakeLoader::with_pages(&[("https://a.example", "textA"), ("https://b.example", "textB")]);
        let blob = resolve_urls(&loader, "https://a.example, https://b.example").await;
        assert_eq!(blob.text, "textA\n\ntextB");
        assert!(blob.failures.is_empty());

        let blob = resolve_urls(&loader, "https://b.example,https://a.example").await;
        assert_eq!(blob.text, "textB\n\ntextA");
    }

    #[tokio::test]
    async fn test_blank_url_list_fetches_nothing() {
        let loader = FakeLoader::default();
        let blob = resolve_urls(&loader, " ,  ").await;
        assert!(blob.is_empty());
        assert_eq!(blob.text, "");
        assert!(loader.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_url_is_isolated() {
        let loader = FakeLoader::with_pages(&[("https://a.example", "textA"), ("https://c.example", "textC")]);
        let blob = resolve_urls(&loader, "https://a.example, https://b.example, https://c.example").await;

        assert_eq!(blob.text, "textA\n\ntextC");
        assert_eq!(blob.failures.len(), 1);
        assert_eq!(blob.failures[0].url, "https://b.example");
        assert_eq!(
            *loader.requested.lock().unwrap(),
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
    }

    #[tokio::test]
    async fn test_search_joins_in_rank_order() {
        let retriever = FakeRetriever {
            documents: vec!["birinci", "ikinci"],
            queries: Mutex::new(Vec::new()),
        };
        let blob = resolve_search(&retriever, "  Arda Güler  ").await.unwrap();
        assert_eq!(blob.text, "birinci\n\nikinci");
        assert_eq!(*retriever.queries.lock().unwrap(), vec!["Arda Güler"]);
    }

    #[tokio::test]
    async fn test_blank_topic_skips_search() {
        let retriever = FakeRetriever {
            documents: vec!["unused"],
            queries: Mutex::new(Vec::new()),
        };
        let blob = resolve_search(&retriever, "   ").await.unwrap();
        assert!(blob.is_empty());
        assert!(retriever.queries.lock().unwrap().is_empty());
    }
}
