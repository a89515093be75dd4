use std::error::Error as StdError;
use std::fmt::{self, Display};

use chat_relay_model::ErrorKind;

use crate::upstream::UpstreamError;

/// Describes why a chat request could not be served.
#[derive(Debug)]
pub enum RelayError {
    /// The request body could not be read as a chat request.
    InvalidRequest(String),
    /// The relay has no credential for the upstream provider.
    MissingCredential,
    /// The upstream provider failed.
    Upstream(UpstreamError),
}

impl RelayError {
    /// Returns the HTTP status the upstream provider answered with.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        match self {
            RelayError::InvalidRequest(_) | RelayError::MissingCredential => {
                None
            }
            RelayError::Upstream(err) => err.status(),
        }
    }

    /// Returns the category of this error for user-facing messages.
    pub fn category(&self) -> ErrorCategory {
        let kind = match self {
            RelayError::Upstream(err) => Some(err.kind()),
            _ => None,
        };
        ErrorCategory::classify(self.status(), kind, &self.to_string())
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::InvalidRequest(message) => write!(f, "{message}"),
            RelayError::MissingCredential => {
                write!(f, "Hugging Face token is not configured.")
            }
            RelayError::Upstream(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for RelayError {}

impl From<UpstreamError> for RelayError {
    #[inline]
    fn from(err: UpstreamError) -> Self {
        RelayError::Upstream(err)
    }
}

/// User-facing categories of a failed completion.
///
/// The categories are derived heuristically from the upstream status code
/// and the wording of the error message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The provider rejected the credential.
    Authentication,
    /// The provider's usage limit was hit.
    RateLimited,
    /// The provider failed on its side.
    UpstreamFault,
    /// The provider could not be reached.
    Network,
    /// The credential is missing or malformed.
    Token,
    /// Anything else.
    Generic,
}

impl ErrorCategory {
    pub fn classify(
        status: Option<u16>,
        kind: Option<ErrorKind>,
        message: &str,
    ) -> Self {
        match status {
            Some(401) => return ErrorCategory::Authentication,
            Some(429) => return ErrorCategory::RateLimited,
            Some(500..=599) => return ErrorCategory::UpstreamFault,
            _ => {}
        }

        let message = message.to_lowercase();
        match kind {
            Some(ErrorKind::Unauthorized) => ErrorCategory::Authentication,
            Some(ErrorKind::RateLimitExceeded) => ErrorCategory::RateLimited,
            Some(ErrorKind::ServerError) => ErrorCategory::UpstreamFault,
            Some(ErrorKind::Network) => ErrorCategory::Network,
            _ if ["fetch", "network", "connect"]
                .iter()
                .any(|word| message.contains(word)) =>
            {
                ErrorCategory::Network
            }
            _ if message.contains("token") => ErrorCategory::Token,
            _ => ErrorCategory::Generic,
        }
    }

    /// Returns the message shown to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => {
                "Authentication error: please check your Hugging Face token."
            }
            ErrorCategory::RateLimited => {
                "API usage limit exceeded: please try again in a moment."
            }
            ErrorCategory::UpstreamFault => {
                "Server error: the VARCO model is having a temporary problem."
            }
            ErrorCategory::Network => {
                "Network error: please check your internet connection."
            }
            ErrorCategory::Token => {
                "Token error: please check your Hugging Face token."
            }
            ErrorCategory::Generic => {
                "Something went wrong while talking to the VARCO API."
            }
        }
    }
}
