use thiserror::Error;

/// User-facing text shown after a message fails twice.
pub const UNDELIVERED_NOTICE: &str = "Something didn't go through. Please try again.";

/// User-facing text shown while the network is unreachable.
pub const OFFLINE_NOTICE: &str = "No internet connection";

/// Final outcome of a failed `send_message` call.
///
/// Attempt-level causes are logged, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("no internet connection")]
    NoConnectivity,

    #[error("message was not delivered after {attempts} attempts")]
    Undelivered { attempts: u32 },
}

impl ChatError {
    /// The notice to show the user for this failure.
    pub fn notice(&self) -> &'static str {
        match self {
            ChatError::NoConnectivity => OFFLINE_NOTICE,
            ChatError::Undelivered { .. } => UNDELIVERED_NOTICE,
        }
    }
}

/// Errors from the session limiter actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session limiter has stopped")]
    Stopped,
}
