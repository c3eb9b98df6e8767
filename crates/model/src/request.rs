use serde_json::Value;

use crate::OpaqueMessage;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelRequest {
    /// The input messages, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
    /// A tool call result.
    Tool(ToolCallResult),
    /// A provider-specific assistant message, usually one that requested
    /// tool calls.
    Opaque(OpaqueMessage),
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolCallResult {
    /// The id of the tool call request this result answers.
    pub id: String,
    /// The text fed back to the model.
    pub content: String,
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool, shown to the model.
    pub description: String,
    /// Parameters definition of the tool, as a
    /// [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}
