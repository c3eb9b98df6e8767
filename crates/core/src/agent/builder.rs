use scout_model::ModelProvider;

use super::{Agent, DEFAULT_MAX_ITERATIONS};
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Executor as ToolExecutor, Tool, ToolObject};

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    system_prompt: Option<String>,
    tools: Vec<Box<dyn ToolObject>>,
    max_iterations: usize,
    handle_parsing_errors: bool,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_prompt: None,
            tools: vec![],
            max_iterations: DEFAULT_MAX_ITERATIONS,
            handle_parsing_errors: true,
        }
    }

    /// Sets the system prompt sent ahead of every conversation.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a tool. A later tool with the same name replaces an
    /// earlier one.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(AnyTool(tool)));
        self
    }

    /// Sets how many model requests one run may make, 15 by default.
    ///
    /// Values below 1 are treated as 1.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Controls what happens when the model produces an unusable tool call
    /// (unknown tool, arguments not matching the schema).
    ///
    /// When enabled (the default) the problem is reported back to the
    /// model as the tool's output and the run continues. When disabled the
    /// run fails.
    #[inline]
    pub fn handle_parsing_errors(mut self, enabled: bool) -> Self {
        self.handle_parsing_errors = enabled;
        self
    }

    /// Builds the agent.
    pub fn build(self) -> Agent {
        Agent {
            model_client: self.model_client,
            tool_executor: ToolExecutor::with_tools(self.tools),
            system_prompt: self.system_prompt,
            max_iterations: self.max_iterations,
            handle_parsing_errors: self.handle_parsing_errors,
        }
    }
}
