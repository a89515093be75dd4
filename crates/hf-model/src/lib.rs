//! A model provider for the Hugging Face inference router.
//!
//! The router speaks the OpenAI-compatible chat completion protocol, and
//! dispatches each request to the inference provider named in the model
//! identifier (`model:provider`).

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use chat_relay_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use mime::Mime;
use reqwest::{Client, RequestBuilder, Response, header};

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_PROVIDER, HfConfig,
    HfConfigBuilder,
};
use io::{Chunks, Sse};
use proto::{ChatCompletion, ErrorBody};
pub use response::HfResponse;

/// Error type for [`HfProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_connect() || err.is_timeout() || err.is_request()
        {
            ErrorKind::Network
        } else if err.is_decode() {
            ErrorKind::InvalidResponse
        } else {
            ErrorKind::Other
        };
        let error = Error::new(format!("{err}"), kind);
        match err.status() {
            Some(status) => error.with_status(status.as_u16()),
            None => error,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.status
    }
}

/// Model provider backed by the Hugging Face inference router.
#[derive(Clone, Debug)]
pub struct HfProvider {
    client: Client,
    config: Arc<HfConfig>,
}

impl HfProvider {
    /// Creates a new `HfProvider` with the given configuration.
    #[inline]
    pub fn new(config: HfConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &HfConfig {
        &self.config
    }

    fn post(&self, req: &ModelRequest, stream: bool) -> RequestBuilder {
        let body = proto::create_request(req, &self.config, stream);
        let accept = if stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        self.client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, accept)
            .json(&body)
    }
}

/// Turns a non-success response into an error carrying the status code and
/// whatever message the router put into the body.
async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(body) => body.into_message(),
        Err(_) if body.trim().is_empty() => format!("HTTP error {status}"),
        Err(_) => format!("HTTP error {status}: {}", body.trim()),
    };
    warn!("upstream replied with {status}: {message}");
    Err(Error::new(message, ErrorKind::from_status(status.as_u16()))
        .with_status(status.as_u16()))
}

impl ModelProvider for HfProvider {
    type Error = Error;
    type Response = HfResponse;

    fn complete(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let resp_fut = self.post(req, false).send();

        async move {
            let resp = check_status(resp_fut.await?).await?;
            let completion: ChatCompletion = resp.json().await?;
            trace!("got completion: {completion:?}");

            completion
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content.unwrap_or_default())
                .ok_or_else(|| {
                    Error::new(
                        "completion has no choices",
                        ErrorKind::InvalidResponse,
                    )
                })
        }
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let resp_fut = self.post(req, true).send();

        async move {
            let resp = check_status(resp_fut.await?).await?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::InvalidResponse,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(HfResponse::from_sse(sse))
        }
    }
}
