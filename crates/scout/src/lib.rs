//! A terminal chat assistant that answers questions with web search, arXiv
//! and Wikipedia lookups.
//!
//! The crate includes a CLI tool for using in the terminal. The pieces it is
//! made of (session, relay, tool bindings) can also be used as a library.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
mod credential;
mod history;
mod relay;
mod session;
pub mod tools;

pub use config::Config;
pub use credential::Credential;
pub use history::{ChatMessage, GREETING, Role, SessionHistory};
pub use relay::{
    AgentFactory, ERROR_PREFIX, Relay, RelayStage, TurnEvent, TurnOutcome,
};
pub use session::{DefaultAgentFactory, SYSTEM_PROMPT, Session, SessionBuilder};

/// Re-exports of [`scout_core`] crate.
pub mod core {
    pub use scout_core::*;
}
