//! A scripted in-process model for tests.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use scout_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, OpaqueMessage,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    preset: PresetResponse,
    opaque_id: String,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let delay = this.delay;
        let timer = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(timer.as_mut().poll(cx));
        this.sleep = None;

        let events = &this.preset.events;
        let event = if this.event_idx < events.len() {
            Some(match &events[this.event_idx] {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            })
        } else if this.event_idx == events.len() {
            Some(ModelResponseEvent::Completed(
                if this.preset.has_tool_call() {
                    ModelFinishReason::ToolCalls
                } else {
                    ModelFinishReason::Stop
                },
            ))
        } else {
            None
        };
        if event.is_some() {
            this.event_idx += 1;
        }
        Poll::Ready(Ok(event))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        Some(OpaqueMessage::new(
            self.opaque_id.clone(),
            self.preset.clone(),
        ))
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Responses are queued up front and handed out in order, one per request,
/// no matter what the request contains. Every received request is
/// recorded so tests can inspect what the agent sent. Once the queue is
/// empty, requests fail.
///
/// Clones share the same queue and records, so a test can keep one handle
/// while another is moved into an agent.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Duration,
}

impl TestModelProvider {
    /// Queues the next response.
    #[inline]
    pub fn push_response(&self, preset: PresetResponse) {
        self.lock().responses.push_back(preset);
    }

    /// Sets the delay before every streamed event, 0 by default.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = duration;
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of queued responses not consumed yet.
    pub fn remaining(&self) -> usize {
        self.lock().responses.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.lock();
        script.requests.push(req.clone());
        let opaque_id = format!("test:{}", script.requests.len());

        let result = match script.responses.pop_front() {
            None => Err(Error {
                message: "test script exhausted".to_owned(),
                kind: ErrorKind::Other,
            }),
            Some(PresetResponse {
                failure: Some(message),
                ..
            }) => Err(Error {
                message,
                kind: ErrorKind::Other,
            }),
            Some(preset) => Ok(TestModelResponse {
                preset,
                opaque_id,
                event_idx: 0,
                delay: self.delay,
                sleep: None,
            }),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use scout_model::{ModelMessage, ToolCallRequest};
    use serde_json::json;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> (String, Option<ToolCallRequest>, ModelFinishReason) {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        let mut tool_call = None;
        loop {
            let event = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
                .await
                .unwrap()
                .unwrap();
            match event {
                ModelResponseEvent::Completed(reason) => {
                    return (msg, tool_call, reason);
                }
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
                ModelResponseEvent::ToolCall(req) => tool_call = Some(req),
            }
        }
    }

    #[tokio::test]
    async fn test_scripted_responses() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Hello, ".to_owned()),
            PresetEvent::MessageDelta("world!".to_owned()),
        ]));
        provider.push_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Let me check.".to_owned()),
            PresetEvent::ToolCall(ToolCallRequest {
                id: "call_1".to_owned(),
                name: "wikipedia".to_owned(),
                arguments: json!({ "query": "Ada Lovelace" }),
            }),
        ]));

        let req = ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            tools: vec![],
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, tool_call, reason) = collect_response(resp).await;
        assert_eq!(msg, "Hello, world!");
        assert!(tool_call.is_none());
        assert_eq!(reason, ModelFinishReason::Stop);

        let resp = provider.send_request(&req).await.unwrap();
        let (msg, tool_call, reason) = collect_response(resp).await;
        assert_eq!(msg, "Let me check.");
        assert_eq!(tool_call.unwrap().name, "wikipedia");
        assert_eq!(reason, ModelFinishReason::ToolCalls);

        assert_eq!(provider.requests().len(), 2);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_failures() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::failing("HTTP 500: boom"));

        let req = ModelRequest::default();
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.to_string(), "HTTP 500: boom");

        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.to_string(), "test script exhausted");
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_script() {
        let provider = TestModelProvider::default();
        let clone = provider.clone();
        provider.push_response(PresetResponse::text("shared"));

        let resp = clone.send_request(&ModelRequest::default()).await.unwrap();
        let (msg, _, _) = collect_response(resp).await;
        assert_eq!(msg, "shared");
        assert_eq!(provider.requests().len(), 1);
    }
}
