//! Session window types.
//!
//! A session window is the span between a session start and its reset.
//! These types describe the limits that govern a window and the
//! observable state the limiter publishes to the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::time::Duration;

/// Limits applied to every session window.
///
/// Loaded from the `[session]` table of `config.toml`. All fields have
/// defaults so a partial table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLimits {
    /// Submissions allowed before the session enters cooldown.
    #[serde(default = "default_max_submissions")]
    pub max_submissions: u32,

    /// Characters allowed per submission. Longer input is truncated.
    #[serde(default = "default_max_characters")]
    pub max_characters: usize,

    /// How long input stays disabled once the cap is reached.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Time spent in background after which the session restarts.
    #[serde(default = "default_background_reset_secs")]
    pub background_reset_secs: u64,
}

fn default_max_submissions() -> u32 {
    10
}

fn default_max_characters() -> usize {
    100
}

fn default_cooldown_secs() -> u64 {
    600
}

fn default_background_reset_secs() -> u64 {
    600
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_submissions: default_max_submissions(),
            max_characters: default_max_characters(),
            cooldown_secs: default_cooldown_secs(),
            background_reset_secs: default_background_reset_secs(),
        }
    }
}

impl SessionLimits {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn background_reset(&self) -> Duration {
        Duration::from_secs(self.background_reset_secs)
    }
}

/// Which half of the limiter state machine a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Submissions are accepted.
    Active,
    /// Cap reached; waiting for the cooldown to expire.
    Limited,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Active => write!(f, "active"),
            SessionPhase::Limited => write!(f, "limited"),
        }
    }
}

/// Point-in-time view of the current session, as shown to the UI.
///
/// `is_input_disabled` is always `!can_submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub phase: SessionPhase,
    pub submission_count: u32,
    pub is_input_disabled: bool,
    pub can_submit: bool,
    pub helper_text: String,
    pub system_message: String,
    pub started_at: DateTime<Utc>,
}

/// Result of registering one submission with the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// Counted; the session is still active.
    Accepted { count: u32 },
    /// Counted, and this submission hit the cap.
    LimitReached { count: u32 },
    /// Input is disabled; nothing was counted.
    Rejected,
}

/// Why a new session window was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStartReason {
    Launch,
    CooldownExpired,
    ScreenLocked,
    BackgroundTimeout,
    Manual,
}

impl fmt::Display for SessionStartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStartReason::Launch => write!(f, "launch"),
            SessionStartReason::CooldownExpired => write!(f, "cooldown_expired"),
            SessionStartReason::ScreenLocked => write!(f, "screen_locked"),
            SessionStartReason::BackgroundTimeout => write!(f, "background_timeout"),
            SessionStartReason::Manual => write!(f, "manual"),
        }
    }
}
