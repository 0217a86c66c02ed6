//! Chat exchange types.
//!
//! A conversation is an ordered, append-only list of [`ChatExchange`]s held
//! in process memory. Position in the list is the submission order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

/// Who authored a chat exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::User => write!(f, "user"),
            Origin::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub text: String,
    pub origin: Origin,
    pub sent_at: DateTime<Utc>,
}

impl ChatExchange {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::User,
            sent_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Assistant,
            sent_at: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }
}
