//! The lookup tools offered to the agent.
//!
//! Every tool is a [`ToolBinding`]: a fixed configuration (result count,
//! content cap, direct return) around one [`Backend`] that talks to an
//! external information source.

mod arxiv;
mod duckduckgo;
mod markup;
mod wikipedia;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use scout_core::tool::{Error as ToolError, Tool, ToolResult};
use serde::Deserialize;
use serde_json::Value;

pub use arxiv::ArxivBackend;
pub use duckduckgo::DuckDuckGoBackend;
pub use wikipedia::WikipediaBackend;

/// How many results the default bindings ask their backend for.
pub const DEFAULT_MAX_RESULTS: usize = 1;

/// How many characters of backend output the default bindings keep.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 1000;

/// Error type for [`Backend`] lookups.
#[derive(Debug)]
pub struct BackendError {
    message: String,
}

impl BackendError {
    /// Creates an error with the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// An external information source.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Looks up `query` and returns at most `max_results` results rendered
    /// as plain text.
    ///
    /// An empty result set is not an error: backends return a sentence
    /// saying nothing was found instead.
    async fn lookup(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<String, BackendError>;
}

/// Input accepted by every lookup tool.
#[derive(Deserialize, JsonSchema)]
pub struct LookupInput {
    #[schemars(description = "The search query.")]
    query: String,
}

/// A lookup tool exposed to the agent.
///
/// Bindings are cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct ToolBinding {
    name: String,
    description: String,
    parameter_schema: Arc<Value>,
    backend: Arc<dyn Backend>,
    max_results: usize,
    max_content_length: usize,
    return_direct: bool,
}

impl ToolBinding {
    /// Creates a binding with the default limits (1 result, 1000
    /// characters) that returns its output directly.
    pub fn new<B: Backend + 'static>(
        name: impl Into<String>,
        description: impl Into<String>,
        backend: B,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: Arc::new(schema_for!(LookupInput).to_value()),
            backend: Arc::new(backend),
            max_results: DEFAULT_MAX_RESULTS,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            return_direct: true,
        }
    }

    /// Sets how many results to ask the backend for.
    #[inline]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Sets how many characters of output to keep.
    #[inline]
    pub fn with_max_content_length(mut self, max_content_length: usize) -> Self {
        self.max_content_length = max_content_length;
        self
    }

    /// Sets whether a successful lookup ends the agent run.
    #[inline]
    pub fn with_return_direct(mut self, return_direct: bool) -> Self {
        self.return_direct = return_direct;
        self
    }

    /// Returns how many results the backend is asked for.
    #[inline]
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Returns the output cap in characters.
    #[inline]
    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }
}

impl Tool for ToolBinding {
    type Input = LookupInput;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn return_direct(&self) -> bool {
        self.return_direct
    }

    fn execute(
        &self,
        input: LookupInput,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let backend = Arc::clone(&self.backend);
        let max_results = self.max_results;
        let max_content_length = self.max_content_length;
        async move {
            debug!("looking up {:?}", input.query);
            backend
                .lookup(&input.query, max_results)
                .await
                .map(|output| truncate_chars(output, max_content_length))
                .map_err(|err| {
                    ToolError::execution_error().with_reason(format!("{err}"))
                })
        }
    }
}

/// The default tool set: web search, arXiv and Wikipedia.
pub fn default_tools() -> Vec<ToolBinding> {
    vec![
        ToolBinding::new(
            "Search",
            "A wrapper around DuckDuckGo Search. Useful for when you need to \
             answer questions about current events. Input should be a search \
             query.",
            DuckDuckGoBackend::new(),
        ),
        ToolBinding::new(
            "arxiv",
            "A wrapper around Arxiv.org. Useful for when you need to answer \
             questions about Physics, Mathematics, Computer Science, \
             Quantitative Biology, Quantitative Finance, Statistics, \
             Electrical Engineering, and Economics from scientific articles \
             on arxiv.org. Input should be a search query.",
            ArxivBackend::new(),
        ),
        ToolBinding::new(
            "wikipedia",
            "A wrapper around Wikipedia. Useful for when you need to answer \
             general questions about people, places, companies, facts, \
             historical events, or other subjects. Input should be a search \
             query.",
            WikipediaBackend::new(),
        ),
    ]
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
    text
}
