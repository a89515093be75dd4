use serde::{Deserialize, Serialize};

/// The author of a chat message.
///
/// Role names the relay doesn't know are kept verbatim in [`Role::Other`]
/// and forwarded upstream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that steer the assistant.
    System,
    /// The human side of the conversation.
    User,
    /// The model side of the conversation.
    Assistant,
    /// Any other role name.
    #[serde(untagged)]
    Other(String),
}

/// One turn of a conversation as sent to the relay.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a message written by the user.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of both chat endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Ordered conversation turns, oldest first.
    pub messages: Vec<ChatMessage>,
}

/// Reply of the health endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"ok"` when the relay answers.
    pub status: String,
    /// A human readable greeting.
    pub message: String,
    /// The model the relay forwards to.
    pub model: String,
    /// Whether the relay has a provider credential.
    pub token_configured: bool,
}

/// Successful reply of the single-shot endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionReply {
    /// Always `true`.
    pub success: bool,
    /// The completion text.
    pub response: String,
}

/// Failure reply of the single-shot endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionFailure {
    /// Always `false`.
    pub success: bool,
    /// The raw error message.
    pub error: String,
    /// A categorized message meant for the end user.
    pub message: String,
    /// The upstream HTTP status, if the failure came with one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}
