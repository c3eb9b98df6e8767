//! Tool call supports.

mod error;
mod executor;

use std::pin::Pin;

use scout_model::ModelTool;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub(crate) use executor::Executor;

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Implementations should not keep mutable state. Configuration (limits,
/// endpoints, clients) is fixed at construction and copied into the
/// future returned by [`Tool::execute`].
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Whether a successful result ends the agent run.
    ///
    /// When `true`, the tool's raw output becomes the final answer of the
    /// run instead of being handed back to the model.
    fn return_direct(&self) -> bool {
        false
    }

    /// Executes the tool with the given input.
    ///
    /// The returned future must not borrow from `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn return_direct(&self) -> bool;

    fn definition(&self) -> ModelTool;

    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn return_direct(&self) -> bool {
        self.0.return_direct()
    }

    fn definition(&self) -> ModelTool {
        ModelTool {
            name: self.0.name().to_owned(),
            description: self.0.description().to_owned(),
            parameters: self.0.parameter_schema().clone(),
        }
    }

    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let input: T::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(std::future::ready(ToolResult::Err(
                    Error::invalid_input().with_reason(reason),
                )));
            }
        };
        Box::pin(self.0.execute(input))
    }
}
