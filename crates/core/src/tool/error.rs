use std::borrow::Cow;
use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input provided to the tool was invalid.
    InvalidInput,
    /// The model asked for a tool that is not registered.
    UnknownTool,
    /// Error occurred while executing the tool.
    ExecutionError,
}

impl ErrorKind {
    /// Whether the error comes from malformed model output rather than
    /// from running the tool.
    #[inline]
    pub fn is_parsing_error(self) -> bool {
        matches!(self, ErrorKind::InvalidInput | ErrorKind::UnknownTool)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "Invalid input"),
            ErrorKind::UnknownTool => write!(f, "Unknown tool"),
            ErrorKind::ExecutionError => write!(f, "Execution error"),
        }
    }
}

/// Describes a tool call error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `InvalidInput` kind.
    #[inline]
    pub fn invalid_input() -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            reason: None,
        }
    }

    /// Creates a new error with the `UnknownTool` kind.
    #[inline]
    pub fn unknown_tool() -> Self {
        Self {
            kind: ErrorKind::UnknownTool,
            reason: None,
        }
    }

    /// Creates a new error with the `ExecutionError` kind.
    #[inline]
    pub fn execution_error() -> Self {
        Self {
            kind: ErrorKind::ExecutionError,
            reason: None,
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error, or the kind's description when
    /// no reason was attached.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::invalid_input().with_reason("missing field `query`");
        assert_eq!(err.to_string(), "Invalid input: missing field `query`");
        assert_eq!(err.reason(), "missing field `query`");
        assert!(err.kind().is_parsing_error());

        let err = Error::execution_error();
        assert_eq!(err.reason(), "Execution error");
        assert!(!err.kind().is_parsing_error());
    }
}
