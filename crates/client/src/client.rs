use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use chat_relay_protocol::{
    ChatMessage, ChatRequest, CompletionFailure, CompletionReply,
    HealthStatus, StreamEvent,
};
use reqwest::{Client, Response, StatusCode, header};

use crate::decoder::EventDecoder;
use crate::error::ClientError;

/// Where the relay listens unless told otherwise.
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3001";

/// An HTTP client for the relay's endpoints.
#[derive(Clone, Debug)]
pub struct RelayClient {
    client: Client,
    base_url: Arc<str>,
}

impl RelayClient {
    /// Creates a client for the relay at `base_url`.
    #[inline]
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Creates a client that sends requests with the given HTTP client.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let resp = self.client.get(self.url("/api/health")).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Http(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }

    /// Asks the single-shot endpoint for a complete reply.
    ///
    /// A failure reported by the relay yields [`ClientError::Relayed`] with
    /// the relay's user-facing message.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<String, ClientError> {
        let resp = self
            .client
            .post(self.url("/api/chat"))
            .json(&ChatRequest { messages })
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let reply: CompletionReply = resp.json().await?;
            return Ok(reply.response);
        }
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            if let Ok(failure) = resp.json::<CompletionFailure>().await {
                debug!("relay failure: {}", failure.error);
                return Err(ClientError::Relayed(failure.message));
            }
        }
        Err(ClientError::Http(status.as_u16()))
    }

    /// Opens the streaming endpoint.
    pub async fn open_stream(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<EventStream, ClientError> {
        let resp = self
            .client
            .post(self.url("/api/chat/stream"))
            .header(header::ACCEPT, "text/event-stream")
            .json(&ChatRequest { messages })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ClientError::Http(resp.status().as_u16()));
        }
        Ok(EventStream::new(Chunks::from_response(resp)))
    }
}

/// An adapter for streaming byte chunks.
pub(crate) enum Chunks {
    Response(Response),
    #[cfg(test)]
    VecDeque(VecDeque<Result<Bytes, ClientError>>),
}

impl Chunks {
    fn from_response(response: Response) -> Self {
        Chunks::Response(response)
    }

    #[inline]
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, ClientError> {
        match self {
            Chunks::Response(response) => Ok(response.chunk().await?),
            #[cfg(test)]
            Chunks::VecDeque(vec) => vec.pop_front().transpose(),
        }
    }
}

/// The events of one streamed reply, decoded as the body arrives.
pub struct EventStream {
    chunks: Chunks,
    decoder: EventDecoder,
    ready: VecDeque<StreamEvent>,
    exhausted: bool,
}

impl EventStream {
    pub(crate) fn new(chunks: Chunks) -> Self {
        Self {
            chunks,
            decoder: EventDecoder::new(),
            ready: Default::default(),
            exhausted: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_chunks(chunks: Vec<Result<Bytes, ClientError>>) -> Self {
        Self::new(Chunks::VecDeque(chunks.into()))
    }

    /// Returns the next event, or `None` once the body has ended.
    pub async fn next_event(
        &mut self,
    ) -> Result<Option<StreamEvent>, ClientError> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Ok(Some(event));
            }
            if self.exhausted {
                return Ok(None);
            }

            match self.chunks.next_chunk().await? {
                Some(bytes) => {
                    trace!("got {} bytes", bytes.len());
                    self.ready.extend(self.decoder.push(&bytes));
                }
                None => {
                    self.exhausted = true;
                    self.ready.extend(self.decoder.finish());
                }
            }
        }
    }
}
