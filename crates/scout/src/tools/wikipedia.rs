use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{Backend, BackendError};

const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const NO_RESULT: &str = "No good Wikipedia Search Result was found";
const MAX_QUERY_LENGTH: usize = 300;
const USER_AGENT: &str =
    concat!("scout/", env!("CARGO_PKG_VERSION"), " (terminal chat assistant)");

/// Encyclopedia lookup through the MediaWiki action API.
///
/// Pages are found with a full text search, then the plain text intro of
/// every hit is fetched.
#[derive(Clone, Debug)]
pub struct WikipediaBackend {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: Option<serde_json::Value>,
    #[serde(default)]
    extract: Option<String>,
}

impl WikipediaBackend {
    /// Creates a backend for English Wikipedia.
    #[inline]
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates a backend for another MediaWiki `api.php` endpoint.
    pub fn with_endpoint<S: Into<String>>(endpoint: S) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        let mut pairs = params.to_vec();
        pairs.extend([("action", "query"), ("format", "json")]);
        let url = Url::parse_with_params(&self.endpoint, &pairs)
            .map_err(|err| BackendError::new(format!("invalid endpoint: {err}")))?;
        let resp = self
            .client
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn summary(&self, title: &str) -> Result<Option<String>, BackendError> {
        let resp: ExtractResponse = self
            .query(&[
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        let page = resp
            .query
            .pages
            .into_values()
            .find(|page| page.missing.is_none());
        Ok(page.and_then(|page| {
            let extract = page.extract?;
            Some(format!("Page: {}\nSummary: {}", page.title, extract.trim()))
        }))
    }
}

impl Default for WikipediaBackend {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for WikipediaBackend {
    async fn lookup(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<String, BackendError> {
        let query: String = query.chars().take(MAX_QUERY_LENGTH).collect();
        let limit = max_results.to_string();
        let search: SearchResponse = self
            .query(&[
                ("list", "search"),
                ("srsearch", query.as_str()),
                ("srlimit", limit.as_str()),
            ])
            .await?;

        let mut pages = Vec::new();
        for hit in search.query.search.iter().take(max_results) {
            match self.summary(&hit.title).await? {
                Some(page) => pages.push(page),
                None => debug!("no extract for {:?}", hit.title),
            }
        }
        if pages.is_empty() {
            return Ok(NO_RESULT.to_owned());
        }
        Ok(pages.join("\n\n"))
    }
}
