use std::fmt::{self, Display};

use scout_model::{ErrorKind as ModelErrorKind, ModelProviderError};

use crate::tool::{Error as ToolError, ErrorKind as ToolErrorKind};

/// The stage at which an agent run failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The model provider failed.
    Model(ModelErrorKind),
    /// A tool failed.
    Tool(ToolErrorKind),
}

/// An agent run failure.
///
/// The message of the underlying error is kept verbatim, so it can be shown
/// to users as is.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub(crate) fn model(err: Box<dyn ModelProviderError>) -> Self {
        Self {
            kind: ErrorKind::Model(err.kind()),
            message: err.to_string(),
        }
    }

    pub(crate) fn tool(err: ToolError) -> Self {
        Self {
            kind: ErrorKind::Tool(err.kind()),
            message: err.reason().into_owned(),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message of the underlying error.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}
