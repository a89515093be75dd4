/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// The input messages.
    pub messages: Vec<ModelMessage>,
    /// Upper bound of tokens the model may generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl ModelRequest {
    /// Creates a request with the given messages and sampling parameters.
    #[inline]
    pub fn new(
        messages: Vec<ModelMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            messages,
            max_tokens,
            temperature,
        }
    }
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
    /// A message under a role the provider may know but this crate doesn't.
    Other {
        /// The role name, forwarded as is.
        role: String,
        /// The message text.
        content: String,
    },
}

impl ModelMessage {
    /// Returns the role name of this message as sent on the wire.
    #[inline]
    pub fn role(&self) -> &str {
        match self {
            ModelMessage::System(_) => "system",
            ModelMessage::User(_) => "user",
            ModelMessage::Assistant(_) => "assistant",
            ModelMessage::Other { role, .. } => role,
        }
    }

    /// Returns the text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            ModelMessage::System(text)
            | ModelMessage::User(text)
            | ModelMessage::Assistant(text)
            | ModelMessage::Other { content: text, .. } => text,
        }
    }
}
