//! Completion request/response types.
//!
//! These types model the data shapes for a single chat-completion call:
//! the request the dispatcher builds, the reply it accepts, and the
//! attempt-level error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to a completion provider.
///
/// Serializes to the `{model, messages, temperature}` body the remote
/// endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
}

/// A successful completion: the reply text is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Why a single completion attempt failed.
///
/// These never reach the dispatcher's caller; they feed the retry policy
/// and the logs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response contained no reply text")]
    EmptyReply,

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}
