use chat_relay_protocol::{ChatMessage, StreamEvent};

use crate::client::{EventStream, RelayClient};
use crate::error::ClientError;
use crate::transcript::{Message, MessageId, Transcript};

/// The first assistant message of every chat.
pub const GREETING: &str =
    "Hello! I'm the VARCO-8B AI chatbot. How can I help you?";

/// Where a session stands in the current exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No request is outstanding.
    Idle,
    /// The request was sent and no event has arrived yet.
    Sending,
    /// The reply is being streamed in.
    Streaming,
}

/// A chat with the relay: its transcript and at most one pending reply.
#[derive(Clone, Debug)]
pub struct ChatSession {
    transcript: Transcript,
    phase: Phase,
    pending: Option<MessageId>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::with_greeting(GREETING),
            phase: Phase::Idle,
            pending: None,
        }
    }

    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    #[inline]
    pub fn is_streaming(&self) -> bool {
        self.phase == Phase::Streaming
    }

    /// The assistant message the current reply is written into.
    #[inline]
    pub fn pending(&self) -> Option<MessageId> {
        self.pending
    }

    /// Starts an exchange for `input`.
    ///
    /// Appends the user message and an in-progress placeholder, then returns
    /// the messages to send. Returns `None` without touching the transcript
    /// if the input is blank or a reply is still loading.
    pub fn begin(&mut self, input: &str) -> Option<Vec<ChatMessage>> {
        if input.trim().is_empty() || self.is_loading() {
            return None;
        }

        self.transcript.push_user(input);
        self.pending = Some(self.transcript.push_placeholder());
        self.phase = Phase::Sending;
        Some(vec![ChatMessage::user(input)])
    }

    /// Applies one event of the reply stream.
    ///
    /// A relayed `error` event is returned as [`ClientError::Relayed`] for
    /// the caller to pass to [`ChatSession::fail`].
    pub fn apply(&mut self, event: StreamEvent) -> Result<(), ClientError> {
        match event {
            StreamEvent::Start => {
                self.phase = Phase::Streaming;
            }
            StreamEvent::Chunk {
                content,
                full_response,
            } => {
                if !content.is_empty() {
                    self.set_pending_text(full_response, true);
                }
            }
            StreamEvent::End { full_response } => {
                self.set_pending_text(full_response, false);
                self.finish();
            }
            StreamEvent::Error { error } => {
                return Err(ClientError::Relayed(error));
            }
        }
        Ok(())
    }

    /// Replaces the pending reply with an apology that names `err`.
    pub fn fail(&mut self, err: &ClientError) {
        self.set_pending_text(
            format!(
                "Sorry, something went wrong: {err}. \
                 Please check that the relay server is running."
            ),
            false,
        );
        self.finish();
    }

    fn set_pending_text(&mut self, text: String, in_progress: bool) {
        let Some(id) = self.pending else {
            warn!("no pending reply to update");
            return;
        };
        self.transcript.update(id, |message| Message {
            text,
            in_progress,
            ..message.clone()
        });
    }

    fn finish(&mut self) {
        self.phase = Phase::Idle;
        self.pending = None;
    }

    /// Sends `input` and streams the reply into the transcript.
    ///
    /// `on_update` is called after every change to the session. Returns
    /// `false` if the send was refused, `true` once the exchange is over,
    /// whether the reply succeeded or not.
    pub async fn send<F>(
        &mut self,
        client: &RelayClient,
        input: &str,
        mut on_update: F,
    ) -> bool
    where
        F: FnMut(&ChatSession),
    {
        let Some(messages) = self.begin(input) else {
            return false;
        };
        on_update(self);

        let result = match client.open_stream(messages).await {
            Ok(stream) => self.drive(stream, &mut on_update).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!("chat request failed: {err}");
            self.fail(&err);
            on_update(self);
        }
        true
    }

    async fn drive<F>(
        &mut self,
        mut stream: EventStream,
        on_update: &mut F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(&ChatSession),
    {
        while let Some(event) = stream.next_event().await? {
            self.apply(event)?;
            on_update(self);
            if !self.is_loading() {
                return Ok(());
            }
        }
        Err(ClientError::UnexpectedEof)
    }
}
