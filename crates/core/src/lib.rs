//! Core logic: the agent loop, tool execution and conversations.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, AgentEvent, DEFAULT_MAX_ITERATIONS, Error,
    ErrorKind, ITERATION_LIMIT_ANSWER,
};
pub use conversation::{Conversation, TranscriptSource};
