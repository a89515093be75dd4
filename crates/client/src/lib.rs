//! A client for the chat relay: the HTTP transport, the stream decoder and
//! the chat session state machine.

#[macro_use]
extern crate tracing;

mod client;
mod decoder;
mod error;
mod lines;
mod session;
mod transcript;

pub use client::{DEFAULT_RELAY_URL, EventStream, RelayClient};
pub use decoder::EventDecoder;
pub use error::ClientError;
pub use lines::LineSplitter;
pub use session::{ChatSession, GREETING, Phase};
pub use transcript::{Message, MessageId, Transcript};
