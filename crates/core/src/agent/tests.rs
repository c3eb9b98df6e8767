use std::future::ready;
use std::sync::{Arc, Mutex};

use scout_model::{ErrorKind as ModelErrorKind, ModelMessage, ToolCallRequest};
use scout_test_model::{PresetEvent, PresetResponse, TestModelProvider};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::conversation::Conversation;
use crate::tool::{Error as ToolError, ErrorKind as ToolErrorKind, Tool, ToolResult};
use crate::{
    AgentBuilder, AgentEvent, ErrorKind, ITERATION_LIMIT_ANSWER,
};

#[derive(Deserialize)]
struct LookupInput {
    query: String,
}

/// Answers every query with a canned line, or fails when `broken`.
struct LookupTool {
    name: &'static str,
    schema: Value,
    direct: bool,
    broken: bool,
}

impl LookupTool {
    fn new(name: &'static str, direct: bool) -> Self {
        Self {
            name,
            schema: json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
            direct,
            broken: false,
        }
    }

    fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

impl Tool for LookupTool {
    type Input = LookupInput;

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Looks things up"
    }

    fn parameter_schema(&self) -> &Value {
        &self.schema
    }

    fn return_direct(&self) -> bool {
        self.direct
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let result = if self.broken {
            Err(ToolError::execution_error()
                .with_reason("connection reset by peer"))
        } else {
            Ok(format!("{} says: {}", self.name, input.query))
        };
        ready(result)
    }
}

fn tool_call(id: &str, name: &str, arguments: Value) -> PresetResponse {
    PresetResponse::with_events([PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments,
    })])
}

fn event_recorder() -> (Arc<Mutex<Vec<AgentEvent>>>, impl Fn(AgentEvent) + Send + Sync + 'static) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let events = Arc::clone(&events);
        move |event| events.lock().unwrap().push(event)
    };
    (events, sink)
}

#[tokio::test]
async fn test_plain_answer() {
    let model_provider = TestModelProvider::default();
    model_provider.push_response(PresetResponse::with_events([
        PresetEvent::MessageDelta("Hi, ".to_owned()),
        PresetEvent::MessageDelta("what can I do for you?".to_owned()),
    ]));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(LookupTool::new("wikipedia", true))
        .build();
    let (events, sink) = event_recorder();
    let answer = agent.run(&Conversation::new(), "Hello", sink).await.unwrap();

    assert_eq!(answer, "Hi, what can I do for you?");
    assert_eq!(
        *events.lock().unwrap(),
        [
            AgentEvent::Thinking { iteration: 1 },
            AgentEvent::Thought("Hi, ".to_owned()),
            AgentEvent::Thought("what can I do for you?".to_owned()),
        ]
    );
    assert_eq!(model_provider.requests().len(), 1);
}

#[tokio::test]
async fn test_request_layout() {
    let model_provider = TestModelProvider::default();
    model_provider.push_response(PresetResponse::text("Paris."));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_system_prompt("Be brief.")
        .with_tool(LookupTool::new("Search", true))
        .with_tool(LookupTool::new("arxiv", true))
        .build();

    let mut history = Conversation::new();
    history.push_assistant("Hi, I'm a chatbot who can search the web.");
    let answer = agent
        .run(&history, "Capital of France?", |_| {})
        .await
        .unwrap();
    assert_eq!(answer, "Paris.");
    // The caller's history is left alone.
    assert_eq!(history.len(), 1);

    let requests = model_provider.requests();
    assert_eq!(
        requests[0].messages,
        [
            ModelMessage::System("Be brief.".to_owned()),
            ModelMessage::Assistant(
                "Hi, I'm a chatbot who can search the web.".to_owned()
            ),
            ModelMessage::User("Capital of France?".to_owned()),
        ]
    );
    let names: Vec<_> =
        requests[0].tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Search", "arxiv"]);
}

#[tokio::test]
async fn test_direct_return() {
    let model_provider = TestModelProvider::default();
    model_provider.push_response(tool_call(
        "call_1",
        "wikipedia",
        json!({ "query": "Ada Lovelace" }),
    ));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(LookupTool::new("wikipedia", true))
        .build();
    let (events, sink) = event_recorder();
    let answer = agent
        .run(&Conversation::new(), "Who was Ada Lovelace?", sink)
        .await
        .unwrap();

    assert_eq!(answer, "wikipedia says: Ada Lovelace");
    assert_eq!(model_provider.requests().len(), 1);
    assert_eq!(
        events.lock().unwrap()[1..],
        [
            AgentEvent::ToolStarted {
                name: "wikipedia".to_owned(),
                input: json!({ "query": "Ada Lovelace" }),
            },
            AgentEvent::ToolFinished {
                name: "wikipedia".to_owned(),
                output: "wikipedia says: Ada Lovelace".to_owned(),
                is_error: false,
            },
        ]
    );
}

#[tokio::test]
async fn test_observation_fed_back() {
    let model_provider = TestModelProvider::default();
    model_provider.push_response(tool_call(
        "call_1",
        "notes",
        json!({ "query": "boiling point" }),
    ));
    model_provider.push_response(PresetResponse::text("100 degrees."));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(LookupTool::new("notes", false))
        .build();
    let answer = agent
        .run(&Conversation::new(), "Water?", |_| {})
        .await
        .unwrap();
    assert_eq!(answer, "100 degrees.");

    let requests = model_provider.requests();
    assert_eq!(requests.len(), 2);
    let messages = &requests[1].messages;
    assert_eq!(messages.len(), 3);
    assert!(matches!(messages[1], ModelMessage::Opaque(_)));
    match &messages[2] {
        ModelMessage::Tool(result) => {
            assert_eq!(result.id, "call_1");
            assert_eq!(result.content, "notes says: boiling point");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_tool_fed_back() {
    let model_provider = TestModelProvider::default();
    model_provider.push_response(tool_call(
        "call_1",
        "calculator",
        json!({ "query": "1+1" }),
    ));
    model_provider.push_response(PresetResponse::text("It's 2."));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(LookupTool::new("Search", true))
        .with_tool(LookupTool::new("wikipedia", true))
        .build();
    let answer = agent
        .run(&Conversation::new(), "1+1?", |_| {})
        .await
        .unwrap();
    assert_eq!(answer, "It's 2.");

    let requests = model_provider.requests();
    let ModelMessage::Tool(result) = &requests[1].messages[2] else {
        panic!("expected a tool result");
    };
    assert_eq!(
        result.content,
        "Unknown tool: calculator is not a valid tool, try one of [Search, wikipedia]."
    );
}

#[tokio::test]
async fn test_parsing_errors_unhandled() {
    let model_provider = TestModelProvider::default();
    model_provider.push_response(tool_call("call_1", "arxiv", Value::Null));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(LookupTool::new("arxiv", true))
        .handle_parsing_errors(false)
        .build();
    let err = agent
        .run(&Conversation::new(), "Papers?", |_| {})
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Tool(ToolErrorKind::InvalidInput));
    assert_eq!(model_provider.requests().len(), 1);
}

#[tokio::test]
async fn test_execution_error() {
    let model_provider = TestModelProvider::default();
    model_provider.push_response(tool_call(
        "call_1",
        "Search",
        json!({ "query": "weather" }),
    ));

    let agent = AgentBuilder::with_model_provider(model_provider)
        .with_tool(LookupTool::new("Search", true).broken())
        .build();
    let (events, sink) = event_recorder();
    let err = agent
        .run(&Conversation::new(), "Weather?", sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Tool(ToolErrorKind::ExecutionError));
    assert_eq!(err.to_string(), "connection reset by peer");
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&AgentEvent::ToolFinished {
            name: "Search".to_owned(),
            output: "Execution error: connection reset by peer".to_owned(),
            is_error: true,
        })
    );
}

#[tokio::test]
async fn test_model_error() {
    let model_provider = TestModelProvider::default();
    model_provider.push_response(PresetResponse::failing("HTTP 500: overloaded"));

    let agent = AgentBuilder::with_model_provider(model_provider).build();
    let err = agent
        .run(&Conversation::new(), "Hello", |_| {})
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Model(ModelErrorKind::Other));
    assert_eq!(err.message(), "HTTP 500: overloaded");
}

#[tokio::test]
async fn test_iteration_limit() {
    let model_provider = TestModelProvider::default();
    for i in 0..3 {
        model_provider.push_response(tool_call(
            &format!("call_{i}"),
            "notes",
            json!({ "query": "again" }),
        ));
    }

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(LookupTool::new("notes", false))
        .with_max_iterations(2)
        .build();
    let answer = agent
        .run(&Conversation::new(), "Loop forever", |_| {})
        .await
        .unwrap();

    assert_eq!(answer, ITERATION_LIMIT_ANSWER);
    assert_eq!(model_provider.requests().len(), 2);
    assert_eq!(model_provider.remaining(), 1);
}
