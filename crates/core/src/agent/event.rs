use serde_json::Value;

/// Intermediate steps reported while an agent run is in progress.
///
/// Events are meant for display only. None of them are part of the final
/// answer unless a direct-return tool produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    /// A new model request is about to be sent. Iterations start at 1.
    Thinking {
        /// The iteration number.
        iteration: usize,
    },
    /// A fragment of the model's text output.
    Thought(String),
    /// A tool is about to run.
    ToolStarted {
        /// Name of the tool.
        name: String,
        /// The arguments as produced by the model.
        input: Value,
    },
    /// A tool has finished.
    ToolFinished {
        /// Name of the tool.
        name: String,
        /// The tool output, or the error description on failure.
        output: String,
        /// Whether the tool failed.
        is_error: bool,
    },
}
