//! Provider-neutral protocol between the agent and chat models.
//!
//! The agent only talks to the types defined here. A provider crate maps
//! them onto a concrete wire format and streams the answer back as a
//! sequence of [`ModelResponseEvent`]s, so the agent never needs to know
//! which service is on the other end.
//!
//! Types in this crate don't define any behavior, they are the contract
//! that provider implementations adhere to.

#![deny(missing_docs)]

mod error;
mod opaque;
mod provider;
mod request;
mod response;

pub use error::*;
pub use opaque::*;
pub use provider::*;
pub use request::*;
pub use response::*;
