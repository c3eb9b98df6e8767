mod builder;
mod error;
mod event;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use scout_model::{ModelMessage, ModelRequest};
use tracing::Instrument;

use crate::conversation::Conversation;
use crate::model_client::ModelClient;
use crate::tool::Executor as ToolExecutor;
pub use builder::AgentBuilder;
pub use error::{Error, ErrorKind};
pub use event::AgentEvent;

/// How many model requests a run may make unless configured otherwise.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// The answer returned when a run hits its iteration limit.
pub const ITERATION_LIMIT_ANSWER: &str =
    "Agent stopped due to iteration limit or time limit.";

type EventSink = Arc<dyn Fn(AgentEvent) + Send + Sync>;

/// An agent bound to one model provider and a fixed tool set.
///
/// The agent itself keeps no conversation state. Each [`Agent::run`] call
/// receives the history it should consider and returns one final answer,
/// so an agent can be built per request and thrown away afterwards.
pub struct Agent {
    model_client: ModelClient,
    tool_executor: ToolExecutor,
    system_prompt: Option<String>,
    max_iterations: usize,
    handle_parsing_errors: bool,
}

impl Agent {
    /// Answers `input` given the earlier `history`.
    ///
    /// The model is asked repeatedly until it replies without tool calls,
    /// a direct-return tool succeeds, or the iteration limit is reached.
    /// Progress is reported through `on_event` as it happens.
    ///
    /// Model failures and tool execution failures end the run with an
    /// error. Unusable tool calls are reported back to the model instead
    /// when parsing-error handling is enabled.
    pub async fn run<F>(
        &self,
        history: &Conversation,
        input: &str,
        on_event: F,
    ) -> Result<String, Error>
    where
        F: Fn(AgentEvent) + Send + Sync + 'static,
    {
        let mut conversation = history.clone();
        conversation.push_user(input);
        let span = debug_span!("agent run", history = history.len());
        self.run_loop(conversation, Arc::new(on_event))
            .instrument(span)
            .await
    }

    async fn run_loop(
        &self,
        mut conversation: Conversation,
        on_event: EventSink,
    ) -> Result<String, Error> {
        for iteration in 1..=self.max_iterations {
            on_event(AgentEvent::Thinking { iteration });

            let request = self.build_model_request(&conversation);
            let resp = self
                .model_client
                .send_request(request, {
                    let on_event = Arc::clone(&on_event);
                    move |delta| on_event(AgentEvent::Thought(delta))
                })
                .await
                .map_err(Error::model)?;

            if resp.tool_calls.is_empty() {
                debug!("finished after {iteration} iteration(s)");
                return Ok(resp.transcript);
            }

            conversation.push_model_reply(resp.opaque_msg, resp.transcript);
            for tool_call in resp.tool_calls {
                let id = tool_call.id.clone();
                let name = tool_call.name.clone();
                on_event(AgentEvent::ToolStarted {
                    name: name.clone(),
                    input: tool_call.arguments.clone(),
                });

                let outcome = self.tool_executor.execute(tool_call).await;
                let observation = match outcome.result {
                    Ok(output) => {
                        on_event(AgentEvent::ToolFinished {
                            name,
                            output: output.clone(),
                            is_error: false,
                        });
                        if outcome.return_direct {
                            debug!("returning tool output directly");
                            return Ok(output);
                        }
                        output
                    }
                    Err(err) => {
                        on_event(AgentEvent::ToolFinished {
                            name,
                            output: err.to_string(),
                            is_error: true,
                        });
                        if !(self.handle_parsing_errors
                            && err.kind().is_parsing_error())
                        {
                            return Err(Error::tool(err));
                        }
                        warn!("feeding tool error back to the model: {err}");
                        err.to_string()
                    }
                };
                conversation.push_tool_result(id, observation);
            }
        }

        warn!("iteration limit ({}) reached", self.max_iterations);
        Ok(ITERATION_LIMIT_ANSWER.to_owned())
    }

    fn build_model_request(&self, conversation: &Conversation) -> ModelRequest {
        let system = self
            .system_prompt
            .as_ref()
            .map(|prompt| ModelMessage::System(prompt.clone()));
        ModelRequest {
            messages: system.into_iter().chain(conversation.messages()).collect(),
            tools: self.tool_executor.definitions(),
        }
    }
}
