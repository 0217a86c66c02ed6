//! Wire types for the chat-completions endpoint.
//!
//! Request bodies reuse `nhoru_types::llm::CompletionRequest`, which already
//! serializes to `{model, messages, temperature}`. Only the response side
//! needs its own shapes. Every field is optional so that the success check
//! can report what was missing instead of failing deserialization.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    /// Legacy `/v1/completions` payloads carry the text here.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// `{"error": {"message": ...}}` body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ChatCompletionResponse {
    /// Reply text of the first choice, preferring `message.content` over
    /// the legacy `text` field.
    pub fn first_reply(&self) -> Option<&str> {
        let choice = self.choices.first()?;
        choice
            .message
            .as_ref()
            .and_then(|m| m.content.as_deref())
            .or(choice.text.as_deref())
    }
}
