use async_trait::async_trait;
use reqwest::{Client, Url, header};

use super::markup::{collapse_whitespace, elements, strip_tags};
use super::{Backend, BackendError};

const DEFAULT_ENDPOINT: &str = "https://lite.duckduckgo.com/lite/";
const NO_RESULT: &str = "No good DuckDuckGo Search Result was found";
// The lite page refuses clients without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) \
                          Gecko/20100101 Firefox/128.0";

/// Web search through the DuckDuckGo lite page. No API key needed.
///
/// The output is the text of the top result snippets joined by spaces.
#[derive(Clone, Debug)]
pub struct DuckDuckGoBackend {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoBackend {
    /// Creates a backend for the public endpoint.
    #[inline]
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Creates a backend that queries `endpoint` instead of the public
    /// lite page.
    pub fn with_endpoint<S: Into<String>>(endpoint: S) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for DuckDuckGoBackend {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for DuckDuckGoBackend {
    async fn lookup(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<String, BackendError> {
        let url = Url::parse_with_params(&self.endpoint, &[("q", query)])
            .map_err(|err| BackendError::new(format!("invalid endpoint: {err}")))?;
        let html = self
            .client
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(render_snippets(&html, max_results))
    }
}

fn render_snippets(html: &str, max_results: usize) -> String {
    let snippets: Vec<_> = elements(html, "td")
        .filter(|cell| cell.has_class("result-snippet"))
        .map(|cell| collapse_whitespace(&strip_tags(cell.inner)))
        .filter(|snippet| !snippet.is_empty())
        .take(max_results)
        .collect();
    if snippets.is_empty() {
        trace!("no snippet in {} bytes of html", html.len());
        return NO_RESULT.to_owned();
    }
    snippets.join(" ")
}
