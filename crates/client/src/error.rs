use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The error type for talking to the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientError {
    /// The relay answered with a non-success status.
    Http(u16),
    /// The relay could not be reached, or the connection broke.
    Network(String),
    /// The relay reported a failure of the upstream provider.
    Relayed(String),
    /// The relay answered with something that isn't understood.
    InvalidResponse(String),
    /// The event stream ended without a terminal event.
    UnexpectedEof,
}

impl Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(status) => {
                write!(f, "HTTP error! status: {status}")
            }
            ClientError::Network(message)
            | ClientError::Relayed(message)
            | ClientError::InvalidResponse(message) => write!(f, "{message}"),
            ClientError::UnexpectedEof => {
                write!(f, "stream ended unexpectedly")
            }
        }
    }
}

impl StdError for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(format!("{err}"))
        } else {
            ClientError::Network(format!("{err}"))
        }
    }
}
