use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scout_core::{Agent, AgentEvent};

use crate::{ChatMessage, Credential, SessionHistory};

/// Prefix of the assistant message stored when a turn fails.
pub const ERROR_PREFIX: &str = "❌ Error: ";

/// Where the relay is within a turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RelayStage {
    /// No turn in progress.
    #[default]
    Idle,
    /// The last turn was dropped for lack of an API key.
    AwaitingCredential,
    /// The agent has been started and has not reported anything yet.
    Invoking,
    /// The agent is reporting intermediate steps.
    Streaming,
    /// The answer has been stored.
    Completed,
}

/// Progress of a turn, for display.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnEvent {
    /// The relay moved to another stage.
    Stage(RelayStage),
    /// An intermediate agent step. Never stored in the history.
    Agent(AgentEvent),
}

/// How a turn ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The input was blank; nothing happened.
    Ignored,
    /// No API key is set; nothing was stored or sent.
    AwaitingCredential,
    /// The agent answered, or failed. Holds the stored assistant message.
    Completed(ChatMessage),
}

/// Builds the agent for one turn.
///
/// A new agent is built for every turn so that a changed key takes effect
/// right away.
pub trait AgentFactory: Send + Sync {
    /// Builds an agent authenticated with `api_key`.
    fn build_agent(&self, api_key: &str) -> Agent;
}

impl<F> AgentFactory for F
where
    F: Fn(&str) -> Agent + Send + Sync,
{
    #[inline]
    fn build_agent(&self, api_key: &str) -> Agent {
        self(api_key)
    }
}

/// Moves user input to the agent and the agent's answer to the history.
pub struct Relay {
    factory: Box<dyn AgentFactory>,
    stage: Arc<Mutex<RelayStage>>,
}

impl Relay {
    /// Creates a relay that builds its agents with `factory`.
    #[inline]
    pub fn new<F: AgentFactory + 'static>(factory: F) -> Self {
        Self::from_boxed(Box::new(factory))
    }

    pub(crate) fn from_boxed(factory: Box<dyn AgentFactory>) -> Self {
        Self {
            factory,
            stage: Arc::default(),
        }
    }

    /// Returns the current stage.
    #[inline]
    pub fn stage(&self) -> RelayStage {
        *lock(&self.stage)
    }

    /// Runs one turn.
    ///
    /// Blank input is ignored. Without a key the turn is dropped and the
    /// history stays as it was. Otherwise the input is stored, the agent is
    /// asked with the earlier history as context, and its answer is stored.
    /// A failed run stores [`ERROR_PREFIX`] followed by the error message
    /// instead, so every accepted turn adds exactly two messages.
    pub async fn submit<F>(
        &self,
        history: &mut SessionHistory,
        credential: &Credential,
        input: &str,
        on_event: F,
    ) -> TurnOutcome
    where
        F: Fn(TurnEvent) + Send + Sync + 'static,
    {
        if input.trim().is_empty() {
            return TurnOutcome::Ignored;
        }
        let Some(api_key) = credential.get() else {
            warn!("no API key set, dropping the message");
            self.set_stage(RelayStage::AwaitingCredential, &on_event);
            return TurnOutcome::AwaitingCredential;
        };

        let context = history.to_conversation();
        history.append(ChatMessage::user(input));
        self.set_stage(RelayStage::Invoking, &on_event);

        let on_event = Arc::new(on_event);
        let agent = self.factory.build_agent(api_key);
        let result = agent
            .run(&context, input, {
                let stage = Arc::clone(&self.stage);
                let on_event = Arc::clone(&on_event);
                move |event| {
                    let entered = {
                        let mut stage = lock(&stage);
                        let entered = *stage != RelayStage::Streaming;
                        *stage = RelayStage::Streaming;
                        entered
                    };
                    if entered {
                        on_event(TurnEvent::Stage(RelayStage::Streaming));
                    }
                    on_event(TurnEvent::Agent(event));
                }
            })
            .await;

        let reply = match result {
            Ok(answer) => ChatMessage::assistant(answer),
            Err(err) => {
                error!("agent run failed: {err}");
                ChatMessage::assistant(format!("{ERROR_PREFIX}{err}"))
            }
        };
        history.append(reply.clone());
        self.set_stage(RelayStage::Completed, &*on_event);
        self.set_stage(RelayStage::Idle, &*on_event);
        TurnOutcome::Completed(reply)
    }

    fn set_stage(&self, stage: RelayStage, on_event: &dyn Fn(TurnEvent)) {
        *lock(&self.stage) = stage;
        trace!("relay stage: {stage:?}");
        on_event(TurnEvent::Stage(stage));
    }
}

fn lock(stage: &Mutex<RelayStage>) -> MutexGuard<'_, RelayStage> {
    stage.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use scout_core::AgentBuilder;
    use scout_model::ModelMessage;
    use scout_test_model::{PresetEvent, PresetResponse, TestModelProvider};

    use super::*;
    use crate::{GREETING, Role};

    fn relay_for(provider: &TestModelProvider) -> Relay {
        let provider = provider.clone();
        Relay::new(move |_api_key: &str| {
            AgentBuilder::with_model_provider(provider.clone()).build()
        })
    }

    fn key(value: &str) -> Credential {
        Credential::new(Some(value.to_owned()))
    }

    fn recorder() -> (Arc<Mutex<Vec<TurnEvent>>>, impl Fn(TurnEvent) + Send + Sync + 'static) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let events = Arc::clone(&events);
            move |event| events.lock().unwrap().push(event)
        };
        (events, sink)
    }

    #[tokio::test]
    async fn test_turns_alternate() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::text("About 300,000 km/s."));
        provider.push_response(PresetResponse::text("Yes, in a vacuum."));
        let relay = relay_for(&provider);
        let mut history = SessionHistory::new();

        for input in ["What is the speed of light?", "Is it constant?"] {
            let outcome =
                relay.submit(&mut history, &key("X"), input, |_| {}).await;
            assert!(matches!(outcome, TurnOutcome::Completed(_)));
        }

        assert_eq!(history.len(), 5);
        let roles: Vec<_> = history.all().iter().map(|m| m.role()).collect();
        assert_eq!(
            roles,
            [
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
        assert_eq!(history.last().unwrap().content(), "Yes, in a vacuum.");

        // The second request carries the whole visible history.
        let requests = provider.requests();
        assert_eq!(
            requests[1].messages,
            [
                ModelMessage::Assistant(GREETING.to_owned()),
                ModelMessage::User("What is the speed of light?".to_owned()),
                ModelMessage::Assistant("About 300,000 km/s.".to_owned()),
                ModelMessage::User("Is it constant?".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let provider = TestModelProvider::default();
        let relay = relay_for(&provider);
        let mut history = SessionHistory::new();
        let (events, sink) = recorder();

        let outcome = relay
            .submit(&mut history, &Credential::default(), "Hello?", sink)
            .await;

        assert_eq!(outcome, TurnOutcome::AwaitingCredential);
        assert_eq!(history, SessionHistory::new());
        assert_eq!(relay.stage(), RelayStage::AwaitingCredential);
        assert_eq!(
            *events.lock().unwrap(),
            [TurnEvent::Stage(RelayStage::AwaitingCredential)]
        );
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_input() {
        let provider = TestModelProvider::default();
        let relay = relay_for(&provider);
        let mut history = SessionHistory::new();

        let outcome = relay.submit(&mut history, &key("X"), "  \n", |_| {}).await;
        assert_eq!(outcome, TurnOutcome::Ignored);
        assert_eq!(history.len(), 1);
        assert_eq!(relay.stage(), RelayStage::Idle);
    }

    #[tokio::test]
    async fn test_failure_is_stored() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::failing("HTTP 401: Invalid API Key"));
        let relay = relay_for(&provider);
        let mut history = SessionHistory::new();

        let outcome = relay
            .submit(&mut history, &key("wrong"), "Hi", |_| {})
            .await;

        let expected = ChatMessage::assistant("❌ Error: HTTP 401: Invalid API Key");
        assert_eq!(outcome, TurnOutcome::Completed(expected.clone()));
        assert_eq!(history.len(), 3);
        assert_eq!(history.last(), Some(&expected));
        assert_eq!(relay.stage(), RelayStage::Idle);
    }

    #[tokio::test]
    async fn test_stage_events() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Hi ".to_owned()),
            PresetEvent::MessageDelta("there".to_owned()),
        ]));
        let relay = relay_for(&provider);
        let mut history = SessionHistory::new();
        let (events, sink) = recorder();

        relay.submit(&mut history, &key("X"), "Hello", sink).await;

        assert_eq!(
            *events.lock().unwrap(),
            [
                TurnEvent::Stage(RelayStage::Invoking),
                TurnEvent::Stage(RelayStage::Streaming),
                TurnEvent::Agent(AgentEvent::Thinking { iteration: 1 }),
                TurnEvent::Agent(AgentEvent::Thought("Hi ".to_owned())),
                TurnEvent::Agent(AgentEvent::Thought("there".to_owned())),
                TurnEvent::Stage(RelayStage::Completed),
                TurnEvent::Stage(RelayStage::Idle),
            ]
        );
        assert_eq!(history.last().unwrap().content(), "Hi there");
    }

    #[tokio::test]
    async fn test_factory_gets_key() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::text("ok"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let relay = Relay::new({
            let seen = Arc::clone(&seen);
            move |api_key: &str| {
                seen.lock().unwrap().push(api_key.to_owned());
                AgentBuilder::with_model_provider(provider.clone()).build()
            }
        });

        let mut history = SessionHistory::new();
        relay
            .submit(&mut history, &key(" gsk_live "), "Hi", |_| {})
            .await;
        assert_eq!(*seen.lock().unwrap(), ["gsk_live"]);
    }
}
