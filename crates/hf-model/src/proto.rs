use chat_relay_model::{ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

use crate::HfConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct CompletionMessage {
    pub content: Option<String>,
}

/// Error bodies come in two shapes depending on which layer of the router
/// rejected the request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Nested { error: ErrorDetail },
    Flat { error: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

impl ErrorBody {
    pub fn into_message(self) -> String {
        match self {
            ErrorBody::Nested { error } => error.message,
            ErrorBody::Flat { error } => error,
        }
    }
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    role: String,
    content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &HfConfig,
    stream: bool,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.routed_model(),
        messages: req.messages.iter().map(create_message).collect(),
        max_tokens: req.max_tokens,
        temperature: req.temperature,
        stream,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    Message {
        role: msg.role().to_owned(),
        content: msg.content().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::HfConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest::new(
            vec![
                ModelMessage::System("You are a helpful assistant.".to_owned()),
                ModelMessage::User("Hello".to_owned()),
                ModelMessage::Other {
                    role: "developer".to_owned(),
                    content: "Be brief.".to_owned(),
                },
            ],
            500,
            0.5,
        );
        let config = HfConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .with_provider("somewhere")
            .build();
        let expected = json!({
            "model": "custom:somewhere",
            "messages": [
                { "role": "system", "content": "You are a helpful assistant." },
                { "role": "user", "content": "Hello" },
                { "role": "developer", "content": "Be brief." },
            ],
            "max_tokens": 500,
            "temperature": 0.5,
            "stream": true,
        });
        let actual =
            serde_json::to_value(create_request(&request, &config, true))
                .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_parse_completion() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("Hi!")
        );
    }

    #[test]
    fn test_parse_error_body() {
        let flat: ErrorBody =
            serde_json::from_str(r#"{"error":"Invalid credentials"}"#).unwrap();
        assert_eq!(flat.into_message(), "Invalid credentials");

        let nested: ErrorBody = serde_json::from_str(
            r#"{"error":{"message":"Rate limit reached","type":"rate_limit"}}"#,
        )
        .unwrap();
        assert_eq!(nested.into_message(), "Rate limit reached");
    }
}
