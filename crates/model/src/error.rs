use std::fmt::{self, Display, Formatter};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credential was rejected by the model provider.
    Unauthorized,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The provider could not be reached, or the connection broke while
    /// streaming.
    Network,
    /// The provider answered with something that cannot be understood.
    InvalidResponse,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::Network => "network error",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::Other => "other error",
        };
        f.write_str(s)
    }
}
