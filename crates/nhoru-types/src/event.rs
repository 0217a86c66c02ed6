//! Event types for the companion event bus.
//!
//! `CompanionEvent` is broadcast whenever the session or delivery state
//! changes. All variants are Clone + Send + Sync for use with tokio
//! broadcast channels.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionStartReason;

/// Events emitted by the companion service.
///
/// Subscribers (UI, logging) observe these; nothing in the core depends
/// on them being delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompanionEvent {
    /// A new session window started.
    SessionStarted {
        session_id: Uuid,
        reason: SessionStartReason,
    },

    /// The submission cap was reached and the cooldown armed.
    SessionLimitReached { session_id: Uuid, count: u32 },

    /// A user message was handed to the dispatcher.
    MessageSent { session_id: Uuid, chars: usize },

    /// The assistant replied.
    ReplyReceived { session_id: Uuid, chars: usize },

    /// The message could not be delivered.
    DeliveryFailed { session_id: Uuid, reason: String },

    /// Network reachability changed.
    ConnectivityChanged { online: bool },
}
