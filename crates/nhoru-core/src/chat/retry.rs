//! Retry-once policy for message delivery.
//!
//! A failed attempt is retried exactly once. What "once" is counted against
//! depends on [`RetryScope`]:
//! - **PerRequest**: every `send_message` call takes a fresh [`RetryTicket`]
//!   with its own flag.
//! - **Shared**: every ticket reads and writes one flag held by the
//!   [`RetryGate`]. Concurrent sends can consume each other's retry.

use std::sync::Mutex;

use nhoru_types::config::RetryScope;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the same request again.
    Retry,
    /// Stop and report the failure. The retry flag has been cleared.
    GiveUp,
}

/// Owner of the retry flag for one dispatcher.
#[derive(Debug)]
pub struct RetryGate {
    scope: RetryScope,
    shared: Mutex<bool>,
}

impl RetryGate {
    pub fn new(scope: RetryScope) -> Self {
        Self {
            scope,
            shared: Mutex::new(false),
        }
    }

    /// Start tracking one `send_message` call.
    pub fn ticket(&self) -> RetryTicket<'_> {
        RetryTicket {
            gate: self,
            has_retried: false,
        }
    }

    /// Current value of the shared flag. Always `false` in per-request
    /// scope.
    pub fn has_retried(&self) -> bool {
        match self.scope {
            RetryScope::PerRequest => false,
            RetryScope::Shared => *self.shared.lock().expect("retry flag lock poisoned"),
        }
    }
}

/// Retry bookkeeping for a single `send_message` call.
#[derive(Debug)]
pub struct RetryTicket<'a> {
    gate: &'a RetryGate,
    has_retried: bool,
}

impl RetryTicket<'_> {
    /// Record a failed attempt and decide whether to try again.
    pub fn on_failure(&mut self) -> RetryDecision {
        match self.gate.scope {
            RetryScope::PerRequest => Self::step(&mut self.has_retried),
            RetryScope::Shared => {
                let mut flag = self.gate.shared.lock().expect("retry flag lock poisoned");
                Self::step(&mut flag)
            }
        }
    }

    /// Record a successful attempt. Clears the flag.
    pub fn on_success(&mut self) {
        match self.gate.scope {
            RetryScope::PerRequest => self.has_retried = false,
            RetryScope::Shared => {
                *self.gate.shared.lock().expect("retry flag lock poisoned") = false;
            }
        }
    }

    fn step(flag: &mut bool) -> RetryDecision {
        if *flag {
            *flag = false;
            RetryDecision::GiveUp
        } else {
            *flag = true;
            RetryDecision::Retry
        }
    }
}
