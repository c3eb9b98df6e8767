//! Byte stream plumbing between `reqwest` and the response decoder.

mod chunks;
mod sse;

pub use chunks::{Chunks, Error as ChunksError};
pub use sse::{Error as SseError, Sse};
