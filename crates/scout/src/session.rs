use scout_core::{Agent, AgentBuilder};
use scout_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

use crate::relay::{AgentFactory, Relay, RelayStage, TurnEvent, TurnOutcome};
use crate::tools::{ToolBinding, default_tools};
use crate::{Config, Credential, SessionHistory};

/// The system prompt of the default agent.
pub const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// Builds agents talking to an OpenAI-compatible endpoint with a fixed
/// tool set.
#[derive(Clone)]
pub struct DefaultAgentFactory {
    base_url: String,
    model: String,
    system_prompt: String,
    tools: Vec<ToolBinding>,
}

impl AgentFactory for DefaultAgentFactory {
    fn build_agent(&self, api_key: &str) -> Agent {
        let config = OpenAIConfigBuilder::with_api_key(api_key)
            .with_base_url(self.base_url.as_str())
            .with_model(self.model.as_str())
            .build();
        let builder = AgentBuilder::with_model_provider(OpenAIProvider::new(config))
            .with_system_prompt(self.system_prompt.as_str())
            .handle_parsing_errors(true);
        self.tools
            .iter()
            .cloned()
            .fold(builder, |builder, tool| builder.with_tool(tool))
            .build()
    }
}

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    config: Config,
    system_prompt: String,
    tools: Option<Vec<ToolBinding>>,
    factory: Option<Box<dyn AgentFactory>>,
}

impl SessionBuilder {
    /// Creates a session builder from a configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            system_prompt: SYSTEM_PROMPT.to_owned(),
            tools: None,
            factory: None,
        }
    }

    /// Replaces the system prompt of the default agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Replaces the default tool set (web search, arXiv, Wikipedia).
    #[inline]
    pub fn with_tools(mut self, tools: Vec<ToolBinding>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Uses `factory` to build agents instead of the default
    /// OpenAI-compatible one. The system prompt and tools set on this
    /// builder are then unused.
    #[inline]
    pub fn with_agent_factory<F: AgentFactory + 'static>(
        mut self,
        factory: F,
    ) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        let Config {
            credential,
            base_url,
            model,
        } = self.config;
        let factory: Box<dyn AgentFactory> = match self.factory {
            Some(factory) => factory,
            None => {
                debug!("using {model} at {base_url}");
                Box::new(DefaultAgentFactory {
                    base_url,
                    model,
                    system_prompt: self.system_prompt,
                    tools: self.tools.unwrap_or_else(default_tools),
                })
            }
        };
        Session {
            history: SessionHistory::new(),
            credential,
            relay: Relay::from_boxed(factory),
        }
    }
}

/// One chat session: a transcript, an API key and the relay between the
/// user and the agent.
///
/// The history lives as long as the session and is never persisted.
pub struct Session {
    history: SessionHistory,
    credential: Credential,
    relay: Relay,
}

impl Session {
    /// Returns the transcript.
    #[inline]
    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Returns the API key.
    #[inline]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Sets the API key used from the next turn on.
    #[inline]
    pub fn set_api_key<S: Into<String>>(&mut self, key: S) {
        self.credential.set(key);
    }

    /// Forgets the API key.
    #[inline]
    pub fn clear_api_key(&mut self) {
        self.credential.clear();
    }

    /// Returns where the relay is within a turn.
    #[inline]
    pub fn stage(&self) -> RelayStage {
        self.relay.stage()
    }

    /// Sends a message and waits for the turn to finish.
    ///
    /// `on_event` receives the progress of the turn as it happens. See
    /// [`Relay::submit`].
    pub async fn send_message<F>(&mut self, text: &str, on_event: F) -> TurnOutcome
    where
        F: Fn(TurnEvent) + Send + Sync + 'static,
    {
        self.relay
            .submit(&mut self.history, &self.credential, text, on_event)
            .await
    }
}
