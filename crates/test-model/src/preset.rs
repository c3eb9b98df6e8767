use scout_model::ToolCallRequest;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// One scripted answer of the test model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails with this message instead of producing
    /// events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a plain text answer streamed as a single delta.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a response that fails the request with `message`.
    #[inline]
    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self {
            events: vec![],
            failure: Some(message.into()),
        }
    }

    pub(crate) fn has_tool_call(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_script_format() {
        let script = json!([
            {
                "events": [
                    { "type": "message_delta", "data": "Searching." },
                    {
                        "type": "tool_call",
                        "data": {
                            "id": "call_1",
                            "name": "Search",
                            "arguments": { "query": "rust 2024 edition" }
                        }
                    }
                ]
            },
            { "events": [], "failure": "HTTP 429: slow down" }
        ]);
        let presets: Vec<PresetResponse> =
            serde_json::from_value(script).unwrap();

        assert!(presets[0].has_tool_call());
        assert_eq!(presets[0].events.len(), 2);
        assert_eq!(presets[1], PresetResponse::failing("HTTP 429: slow down"));
    }
}
