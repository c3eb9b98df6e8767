use async_trait::async_trait;
use reqwest::{Client, Url};

use super::markup::{Element, elements};
use super::{Backend, BackendError};

const DEFAULT_ENDPOINT: &str = "http://export.arxiv.org/api/query";
const NO_RESULT: &str = "No good Arxiv Result was found";
const MAX_QUERY_LENGTH: usize = 300;

/// Paper lookup through the arXiv Atom API.
///
/// Every matching paper is rendered as its date, title, authors and
/// abstract.
#[derive(Clone, Debug)]
pub struct ArxivBackend {
    client: Client,
    endpoint: String,
}

impl ArxivBackend {
    /// Creates a backend for the public API.
    #[inline]
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates a backend that queries `endpoint` instead of the public API.
    pub fn with_endpoint<S: Into<String>>(endpoint: S) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for ArxivBackend {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for ArxivBackend {
    async fn lookup(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<String, BackendError> {
        let query: String = query.chars().take(MAX_QUERY_LENGTH).collect();
        let max_results = max_results.to_string();
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("search_query", query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ],
        )
        .map_err(|err| BackendError::new(format!("invalid endpoint: {err}")))?;
        let feed = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        render_feed(&feed)
    }
}

fn render_feed(feed: &str) -> Result<String, BackendError> {
    let mut papers = Vec::new();
    for entry in elements(feed, "entry") {
        // The API reports bad queries as a feed with a single error entry.
        let id = entry.child_text("id").unwrap_or_default();
        if id.contains("/api/errors") {
            let summary = entry.child_text("summary").unwrap_or(id);
            return Err(BackendError::new(format!("arXiv error: {summary}")));
        }
        papers.push(render_entry(&entry));
    }
    if papers.is_empty() {
        return Ok(NO_RESULT.to_owned());
    }
    Ok(papers.join("\n\n"))
}

fn render_entry(entry: &Element<'_>) -> String {
    let date = entry
        .child_text("updated")
        .or_else(|| entry.child_text("published"))
        .unwrap_or_default();
    let date = date.split('T').next().unwrap_or_default();
    let authors: Vec<_> = elements(entry.inner, "author")
        .filter_map(|author| author.child_text("name"))
        .collect();
    format!(
        "Published: {date}\nTitle: {}\nAuthors: {}\nSummary: {}",
        entry.child_text("title").unwrap_or_default(),
        authors.join(", "),
        entry.child_text("summary").unwrap_or_default(),
    )
}
