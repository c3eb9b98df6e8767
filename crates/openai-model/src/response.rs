use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use scout_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage, ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::{ChatCompletionChunk, Message, ToolCall};

struct PartialState {
    sse: Sse,
    id: Option<String>,
    content: String,
    tool_calls: Vec<ToolCall>,
    // Indices into `tool_calls` that have started streaming but were not
    // yet emitted. They are only emitted once the model finished, since the
    // argument string arrives in pieces.
    pending_tool_call_idx: VecDeque<usize>,
    finished: bool,
    // Cleared after the `Completed` event has been emitted.
    pending_finish_reason: Option<ModelFinishReason>,
}

impl PartialState {
    fn finish(self) -> Option<(String, Message)> {
        Some((
            self.id?,
            Message::Assistant {
                content: Some(self.content),
                tool_calls: if self.tool_calls.is_empty() {
                    None
                } else {
                    Some(self.tool_calls)
                },
            },
        ))
    }

    fn merge_tool_call(&mut self, tool_call: ToolCall) {
        let Some(partial) = self
            .tool_calls
            .iter_mut()
            .find(|t| t.index == tool_call.index)
        else {
            self.pending_tool_call_idx.push_back(self.tool_calls.len());
            self.tool_calls.push(tool_call);
            return;
        };

        if let Some(id) = tool_call.id {
            partial.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = tool_call.r#type {
            // The type is repeated by some servers, don't concatenate it.
            partial.r#type.get_or_insert(ty);
        }
        let Some(function) = tool_call.function else {
            return;
        };
        match partial.function {
            Some(ref mut partial_func) => {
                if let Some(name) = function.name {
                    partial_func.name.get_or_insert_default().push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    partial_func
                        .arguments
                        .get_or_insert_default()
                        .push_str(&arguments);
                }
            }
            None => partial.function = Some(function),
        }
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    /// A streamed chat completion.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        full_msg: Option<(String, Message)>,
    }
}

impl OpenAIResponse {
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            id: None,
            content: String::new(),
            tool_calls: Vec::new(),
            pending_tool_call_idx: VecDeque::new(),
            finished: false,
            pending_finish_reason: None,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(partial_state))),
            full_msg: None,
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, partial_state)) => {
                    *this.next_event_fut = None;
                    *this.full_msg = partial_state.finish();
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        *this.next_event_fut = Some(Box::pin(next_event(partial_state)));
        Poll::Ready(Ok(Some(event)))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        self.full_msg
            .as_ref()
            .map(|(id, msg)| OpaqueMessage::new(id, msg.clone()))
    }
}

async fn next_event(mut state: PartialState) -> NextEvent {
    let mut message_delta = None;

    while !state.finished {
        let sse_event = match state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                state.finished = true;
                break;
            }
            Err(SseError::Chunks(err)) => {
                return Err(Error::new(err.0, ErrorKind::Network));
            }
            Err(err) => {
                return Err(Error::new(
                    format!("malformed event stream: {err:?}"),
                    ErrorKind::InvalidResponse,
                ));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            state.finished = true;
            break;
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::InvalidResponse)
            })?;
        if state.id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id {
            return Err(Error::new(
                "chunk id mismatch",
                ErrorKind::InvalidResponse,
            ));
        }

        // Usage-only chunks carry no choices.
        let Some(choice) = chunk.choices.pop() else {
            continue;
        };

        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                state.content.push_str(&content);
                message_delta = Some(content);
            }
        }
        for tool_call in choice.delta.tool_calls.unwrap_or_default() {
            state.merge_tool_call(tool_call);
        }
        if let Some(finish_reason) = choice.finish_reason {
            state.pending_finish_reason = Some(if finish_reason == "tool_calls"
            {
                ModelFinishReason::ToolCalls
            } else {
                ModelFinishReason::Stop
            });
            state.finished = true;
        }

        if message_delta.is_some() {
            break;
        }
    }

    // Always emit message delta first, then pending tool calls (only when
    // the stream is done), and finally the finish reason.

    if let Some(message_delta) = message_delta {
        return Ok((Some(ModelResponseEvent::MessageDelta(message_delta)), state));
    }

    if let Some(idx) = state.pending_tool_call_idx.pop_front() {
        let tool_call = &state.tool_calls[idx];
        let id = tool_call.id.clone().unwrap_or_default();
        let function = tool_call.function.as_ref();
        let name = function.and_then(|f| f.name.clone()).unwrap_or_default();
        let arguments = function
            .and_then(|f| f.arguments.as_deref())
            .and_then(|args| serde_json::from_str::<Value>(args).ok())
            .unwrap_or_default();
        return Ok((
            Some(ModelResponseEvent::ToolCall(ToolCallRequest {
                id,
                name,
                arguments,
            })),
            state,
        ));
    }

    if let Some(finish_reason) = state.pending_finish_reason.take() {
        return Ok((Some(ModelResponseEvent::Completed(finish_reason)), state));
    }

    Ok((None, state))
}
