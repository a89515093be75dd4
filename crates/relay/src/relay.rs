use std::sync::Arc;

use chat_relay_model::{ModelMessage, ModelRequest};
use chat_relay_protocol::{ChatMessage, HealthStatus, Role, StreamEvent};
use futures_util::stream::{self, Stream, StreamExt};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::upstream::{FragmentStream, UpstreamClient};

/// The relay between chat clients and the upstream provider.
///
/// Each request is served independently; the only shared state is the
/// configuration and the upstream client, both read-only.
#[derive(Clone)]
pub struct Relay {
    config: Arc<RelayConfig>,
    upstream: UpstreamClient,
}

impl Relay {
    #[inline]
    pub fn new(config: RelayConfig, upstream: UpstreamClient) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_owned(),
            message: "VARCO chatbot relay is running.".to_owned(),
            model: self.config.model_name(),
            token_configured: self.config.has_token(),
        }
    }

    /// Requests a bounded completion and waits for the whole text.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<String, RelayError> {
        self.ensure_credential()?;
        let req = ModelRequest::new(
            to_model_messages(messages),
            self.config.completion_max_tokens,
            self.config.temperature,
        );
        let text = self.upstream.complete(req).await?;
        debug!("completion: {text:?}");
        Ok(text)
    }

    /// Streams a completion as relay events.
    ///
    /// The stream always yields `Start` first and ends with exactly one
    /// terminal event. Failures, including a missing credential, are
    /// reported as an `Error` event rather than through a separate channel.
    pub fn stream(
        &self,
        messages: Vec<ChatMessage>,
    ) -> impl Stream<Item = StreamEvent> + Send + use<> {
        let state = match self.ensure_credential() {
            Ok(()) => StreamState::Opening(
                self.upstream.clone(),
                ModelRequest::new(
                    to_model_messages(messages),
                    self.config.stream_max_tokens,
                    self.config.temperature,
                ),
            ),
            Err(err) => StreamState::Failed(err),
        };
        events(state)
    }

    /// Streams the events of a request refused before it reached the relay:
    /// `Start`, then a single `Error`.
    pub fn stream_failure(
        err: RelayError,
    ) -> impl Stream<Item = StreamEvent> + Send + 'static {
        events(StreamState::Failed(err))
    }

    fn ensure_credential(&self) -> Result<(), RelayError> {
        if self.config.has_token() {
            Ok(())
        } else {
            Err(RelayError::MissingCredential)
        }
    }
}

enum StreamState {
    Opening(UpstreamClient, ModelRequest),
    Streaming {
        fragments: FragmentStream,
        full_response: String,
    },
    Failed(RelayError),
    Finished,
}

fn events(state: StreamState) -> impl Stream<Item = StreamEvent> + Send {
    stream::once(async { StreamEvent::Start })
        .chain(stream::unfold(state, advance))
}

async fn advance(state: StreamState) -> Option<(StreamEvent, StreamState)> {
    match state {
        StreamState::Opening(upstream, req) => match upstream.stream(req).await
        {
            Ok(fragments) => next_chunk(fragments, String::new()).await,
            Err(err) => Some(fail(err.into())),
        },
        StreamState::Streaming {
            fragments,
            full_response,
        } => next_chunk(fragments, full_response).await,
        StreamState::Failed(err) => Some(fail(err)),
        StreamState::Finished => None,
    }
}

async fn next_chunk(
    mut fragments: FragmentStream,
    mut full_response: String,
) -> Option<(StreamEvent, StreamState)> {
    loop {
        match fragments.next().await {
            Some(Ok(content)) => {
                if content.is_empty() {
                    continue;
                }
                full_response.push_str(&content);
                let event = StreamEvent::Chunk {
                    content,
                    full_response: full_response.clone(),
                };
                return Some((
                    event,
                    StreamState::Streaming {
                        fragments,
                        full_response,
                    },
                ));
            }
            Some(Err(err)) => return Some(fail(err.into())),
            None => {
                debug!("stream completed with {} bytes", full_response.len());
                return Some((
                    StreamEvent::End { full_response },
                    StreamState::Finished,
                ));
            }
        }
    }
}

fn fail(err: RelayError) -> (StreamEvent, StreamState) {
    error!("streaming failed: {err}");
    let event = StreamEvent::Error {
        error: err.to_string(),
    };
    (event, StreamState::Finished)
}

fn to_model_messages(messages: Vec<ChatMessage>) -> Vec<ModelMessage> {
    messages
        .into_iter()
        .map(|msg| match msg.role {
            Role::System => ModelMessage::System(msg.content),
            Role::User => ModelMessage::User(msg.content),
            Role::Assistant => ModelMessage::Assistant(msg.content),
            Role::Other(role) => ModelMessage::Other {
                role,
                content: msg.content,
            },
        })
        .collect()
}
