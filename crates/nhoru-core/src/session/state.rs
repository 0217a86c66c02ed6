//! Session limiter state machine.
//!
//! Two phases: Active and Limited. A session moves to Limited when its
//! submission count reaches the cap and back to Active (as a brand-new
//! session) when the cooldown expires. Background timeouts and screen
//! locks also start a new session.
//!
//! Every method takes the current instant from the caller, so the machine
//! itself never reads a clock.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use nhoru_types::session::{SessionLimits, SessionPhase, SessionSnapshot, SubmissionOutcome};

/// Deadline offset used when the configured cooldown overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// One session window. Replaced wholesale on restart.
#[derive(Debug, Clone)]
struct Session {
    id: Uuid,
    submission_count: u32,
    can_submit: bool,
    helper_text: String,
    system_message: String,
    started_at: DateTime<Utc>,
}

impl Session {
    fn fresh() -> Self {
        Self {
            id: Uuid::now_v7(),
            submission_count: 0,
            can_submit: true,
            helper_text: String::new(),
            system_message: String::new(),
            started_at: Utc::now(),
        }
    }
}

/// Submission counter with cooldown and background-reset bookkeeping.
#[derive(Debug)]
pub struct SessionState {
    limits: SessionLimits,
    session: Session,
    background_entered_at: Option<Instant>,
    cooldown_deadline: Option<Instant>,
}

impl SessionState {
    /// Create the state with a fresh session already started.
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            limits,
            session: Session::fresh(),
            background_entered_at: None,
            cooldown_deadline: None,
        }
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id
    }

    pub fn submission_count(&self) -> u32 {
        self.session.submission_count
    }

    pub fn can_submit(&self) -> bool {
        self.session.can_submit
    }

    pub fn phase(&self) -> SessionPhase {
        if self.session.can_submit {
            SessionPhase::Active
        } else {
            SessionPhase::Limited
        }
    }

    /// When the pending cooldown fires, if one is armed.
    pub fn cooldown_deadline(&self) -> Option<Instant> {
        self.cooldown_deadline
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.session.id,
            phase: self.phase(),
            submission_count: self.session.submission_count,
            is_input_disabled: !self.session.can_submit,
            can_submit: self.session.can_submit,
            helper_text: self.session.helper_text.clone(),
            system_message: self.session.system_message.clone(),
            started_at: self.session.started_at,
        }
    }

    /// Replace the session with a fresh one, disarm the cooldown and forget
    /// any background timestamp. Nothing carries over into the new session.
    pub fn start_new_session(&mut self) {
        self.session = Session::fresh();
        self.cooldown_deadline = None;
        self.background_entered_at = None;
    }

    /// Update the helper text for the current input length.
    pub fn validate_characters(&mut self, count: usize) {
        if count >= self.limits.max_characters {
            self.session.helper_text = format!(
                "Character limit reached ({} max)",
                self.limits.max_characters
            );
        } else {
            self.session.helper_text.clear();
        }
    }

    /// Truncate `text` to the per-submission character cap.
    pub fn clamp_input(&self, text: &str) -> String {
        clamp_chars(text, self.limits.max_characters)
    }

    /// Count one submission.
    ///
    /// A no-op returning `Rejected` while input is disabled.
    pub fn register_submission(&mut self, now: Instant) -> SubmissionOutcome {
        if !self.session.can_submit {
            return SubmissionOutcome::Rejected;
        }

        self.session.submission_count += 1;
        let count = self.session.submission_count;

        if count >= self.limits.max_submissions {
            self.enter_limited(now);
            SubmissionOutcome::LimitReached { count }
        } else {
            SubmissionOutcome::Accepted { count }
        }
    }

    fn enter_limited(&mut self, now: Instant) {
        self.session.can_submit = false;
        self.session.helper_text.clear();
        self.session.system_message = limit_notice(self.limits.cooldown());
        let deadline = now
            .checked_add(self.limits.cooldown())
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.cooldown_deadline = Some(deadline);
    }

    /// Start a new session if the cooldown deadline has passed.
    ///
    /// Returns `true` when a new session was started. Calling this with no
    /// cooldown armed, or before the deadline, does nothing.
    pub fn expire_cooldown(&mut self, now: Instant) -> bool {
        match self.cooldown_deadline {
            Some(deadline) if now >= deadline => {
                self.start_new_session();
                true
            }
            _ => false,
        }
    }

    pub fn enter_background(&mut self, now: Instant) {
        self.background_entered_at = Some(now);
    }

    /// Handle a return to the foreground.
    ///
    /// Starts a new session when the time spent in background is at least
    /// the reset threshold (inclusive). The background timestamp is
    /// cleared either way. Returns `true` when a new session was started.
    pub fn enter_foreground(&mut self, now: Instant) -> bool {
        let Some(entered_at) = self.background_entered_at.take() else {
            return false;
        };

        let elapsed = now.saturating_duration_since(entered_at);
        if elapsed >= self.limits.background_reset() {
            self.start_new_session();
            true
        } else {
            false
        }
    }

    /// A screen lock always starts a new session.
    pub fn screen_locked(&mut self) {
        self.start_new_session();
    }
}

/// The notice shown while a session is cooling down.
pub fn limit_notice(cooldown: Duration) -> String {
    format!(
        "We'll pause here for now.\nSmall sessions work best here.\nYou can restart in {}.",
        humanize(cooldown)
    )
}

fn humanize(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    } else if secs == 1 {
        "1 second".to_string()
    } else {
        format!("{secs} seconds")
    }
}

/// Keep at most `max` characters (Unicode scalar values) of `text`.
pub fn clamp_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> SessionLimits {
        SessionLimits {
            max_submissions: 10,
            max_characters: 100,
            cooldown_secs: 10,
            background_reset_secs: 5,
        }
    }

    #[test]
    fn test_new_state_is_active() {
        let state = SessionState::new(limits());
        let snap = state.snapshot();
        assert_eq!(snap.phase, SessionPhase::Active);
        assert_eq!(snap.submission_count, 0);
        assert!(snap.can_submit);
        assert!(!snap.is_input_disabled);
        assert!(snap.helper_text.is_empty());
        assert!(snap.system_message.is_empty());
        assert!(state.cooldown_deadline().is_none());
    }

    #[test]
    fn test_register_submission_counts_by_one_until_cap() {
        let mut state = SessionState::new(limits());
        let now = Instant::now();

        for expected in 1..10 {
            let outcome = state.register_submission(now);
            assert_eq!(outcome, SubmissionOutcome::Accepted { count: expected });
            assert_eq!(state.phase(), SessionPhase::Active);
        }

        // 10th submission hits the cap
        let outcome = state.register_submission(now);
        assert_eq!(outcome, SubmissionOutcome::LimitReached { count: 10 });
        assert_eq!(state.phase(), SessionPhase::Limited);

        let snap = state.snapshot();
        assert!(!snap.can_submit);
        assert!(snap.is_input_disabled);
        assert!(snap.system_message.starts_with("We'll pause here for now."));
        assert_eq!(state.cooldown_deadline(), Some(now + Duration::from_secs(10)));
    }

    #[test]
    fn test_limited_state_ignores_submissions() {
        let mut state = SessionState::new(limits());
        let now = Instant::now();
        for _ in 0..10 {
            state.register_submission(now);
        }

        for _ in 0..5 {
            assert_eq!(state.register_submission(now), SubmissionOutcome::Rejected);
        }
        assert_eq!(state.submission_count(), 10);
    }

    #[test]
    fn test_limit_entry_clears_helper_text() {
        let mut state = SessionState::new(limits());
        state.validate_characters(150);
        assert!(!state.snapshot().helper_text.is_empty());

        let now = Instant::now();
        for _ in 0..10 {
            state.register_submission(now);
        }
        assert!(state.snapshot().helper_text.is_empty());
    }

    #[test]
    fn test_cooldown_expiry_starts_new_session() {
        let mut state = SessionState::new(limits());
        let now = Instant::now();
        for _ in 0..10 {
            state.register_submission(now);
        }
        let limited_id = state.session_id();

        // Just before the deadline nothing happens
        assert!(!state.expire_cooldown(now + Duration::from_millis(9_999)));
        assert_eq!(state.phase(), SessionPhase::Limited);

        assert!(state.expire_cooldown(now + Duration::from_secs(10)));
        let snap = state.snapshot();
        assert!(snap.can_submit);
        assert_eq!(snap.submission_count, 0);
        assert!(snap.system_message.is_empty());
        assert_ne!(snap.id, limited_id);
        assert!(state.cooldown_deadline().is_none());
    }

    #[test]
    fn test_expire_cooldown_without_deadline_is_noop() {
        let mut state = SessionState::new(limits());
        let id = state.session_id();
        assert!(!state.expire_cooldown(Instant::now() + Duration::from_secs(3600)));
        assert_eq!(state.session_id(), id);
    }

    #[test]
    fn test_start_new_session_disarms_cooldown() {
        let mut state = SessionState::new(limits());
        let now = Instant::now();
        for _ in 0..10 {
            state.register_submission(now);
        }
        state.start_new_session();
        assert!(state.cooldown_deadline().is_none());

        // A late expiry check must not restart the replacement session
        let replacement = state.session_id();
        assert!(!state.expire_cooldown(now + Duration::from_secs(60)));
        assert_eq!(state.session_id(), replacement);
    }

    #[test]
    fn test_validate_characters_threshold() {
        let mut state = SessionState::new(limits());
        for n in [0, 1, 50, 99] {
            state.validate_characters(n);
            assert!(state.snapshot().helper_text.is_empty(), "n={n}");
        }
        for n in [100, 101, 1_000] {
            state.validate_characters(n);
            assert_eq!(
                state.snapshot().helper_text,
                "Character limit reached (100 max)",
                "n={n}"
            );
        }
        // Shrinking the input clears the hint again
        state.validate_characters(10);
        assert!(state.snapshot().helper_text.is_empty());
    }

    #[test]
    fn test_validate_characters_leaves_submission_state() {
        let mut state = SessionState::new(limits());
        state.register_submission(Instant::now());
        state.validate_characters(500);
        assert_eq!(state.submission_count(), 1);
        assert!(state.can_submit());
    }

    #[test]
    fn test_foreground_before_threshold_keeps_session() {
        let mut state = SessionState::new(limits());
        let t0 = Instant::now();
        state.register_submission(t0);
        let id = state.session_id();

        state.enter_background(t0);
        assert!(!state.enter_foreground(t0 + Duration::from_secs(4)));
        assert_eq!(state.session_id(), id);
        assert_eq!(state.submission_count(), 1);
    }

    #[test]
    fn test_foreground_at_threshold_resets_inclusive() {
        let mut state = SessionState::new(limits());
        let t0 = Instant::now();
        state.register_submission(t0);
        let id = state.session_id();

        state.enter_background(t0);
        assert!(state.enter_foreground(t0 + Duration::from_secs(5)));
        assert_ne!(state.session_id(), id);
        assert_eq!(state.submission_count(), 0);
    }

    #[test]
    fn test_foreground_after_threshold_resets() {
        let mut state = SessionState::new(limits());
        let t0 = Instant::now();
        state.register_submission(t0);

        state.enter_background(t0);
        assert!(state.enter_foreground(t0 + Duration::from_secs(6)));
        assert_eq!(state.submission_count(), 0);
    }

    #[test]
    fn test_foreground_clears_background_timestamp() {
        let mut state = SessionState::new(limits());
        let t0 = Instant::now();
        state.enter_background(t0);
        state.enter_foreground(t0 + Duration::from_secs(1));

        // A second foreground with no background in between never resets
        let id = state.session_id();
        assert!(!state.enter_foreground(t0 + Duration::from_secs(60)));
        assert_eq!(state.session_id(), id);
    }

    #[test]
    fn test_foreground_without_background_is_noop() {
        let mut state = SessionState::new(limits());
        let id = state.session_id();
        assert!(!state.enter_foreground(Instant::now()));
        assert_eq!(state.session_id(), id);
    }

    #[test]
    fn test_screen_lock_always_resets() {
        let mut state = SessionState::new(limits());
        let now = Instant::now();
        for _ in 0..10 {
            state.register_submission(now);
        }
        assert_eq!(state.phase(), SessionPhase::Limited);

        state.screen_locked();
        assert_eq!(state.phase(), SessionPhase::Active);
        assert_eq!(state.submission_count(), 0);
        assert!(state.cooldown_deadline().is_none());

        // Also resets a fresh, untouched session
        let id = state.session_id();
        state.screen_locked();
        assert_ne!(state.session_id(), id);
    }

    #[test]
    fn test_clamp_input_truncates_by_chars() {
        let state = SessionState::new(SessionLimits {
            max_characters: 5,
            ..limits()
        });
        assert_eq!(state.clamp_input("hello world"), "hello");
        assert_eq!(state.clamp_input("hi"), "hi");
        assert_eq!(state.clamp_input("hōrunō"), "hōrun");
    }

    #[test]
    fn test_limit_notice_wording() {
        assert_eq!(
            limit_notice(Duration::from_secs(600)),
            "We'll pause here for now.\nSmall sessions work best here.\nYou can restart in 10 minutes."
        );
        assert!(limit_notice(Duration::from_secs(60)).ends_with("in 1 minute."));
        assert!(limit_notice(Duration::from_secs(10)).ends_with("in 10 seconds."));
    }

    #[test]
    fn test_huge_cooldown_saturates_deadline() {
        let mut state = SessionState::new(SessionLimits {
            max_submissions: 1,
            cooldown_secs: u64::MAX,
            ..limits()
        });
        let now = Instant::now();

        assert_eq!(
            state.register_submission(now),
            SubmissionOutcome::LimitReached { count: 1 }
        );
        assert_eq!(state.cooldown_deadline(), Some(now + FAR_FUTURE));
        assert!(!state.expire_cooldown(now + Duration::from_secs(86_400 * 365)));
        assert_eq!(state.phase(), SessionPhase::Limited);
    }

    #[test]
    fn test_screen_lock_while_backgrounded_resets_once() {
        let mut state = SessionState::new(limits());
        let t0 = Instant::now();
        state.enter_background(t0);

        state.screen_locked();
        let locked_id = state.session_id();

        // The lock already replaced the session; coming back late must not
        // replace it again.
        assert!(!state.enter_foreground(t0 + Duration::from_secs(60)));
        assert_eq!(state.session_id(), locked_id);
    }
}
