//! Session limiter actor.
//!
//! A single task owns the [`SessionState`]. Every operation is a message on
//! an mpsc channel with a oneshot reply, so no two transitions ever
//! interleave. The cooldown is not a separate timer: the actor awaits the
//! state's cooldown deadline inside its `select!` loop and re-reads it after
//! every transition, so starting a new session disarms it in the same step.
//!
//! The latest [`SessionSnapshot`] is published on a `watch` channel before
//! each reply is sent, so a caller that awaited an operation always observes
//! its effect.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use nhoru_types::error::SessionError;
use nhoru_types::event::CompanionEvent;
use nhoru_types::session::{
    SessionLimits, SessionSnapshot, SessionStartReason, SubmissionOutcome,
};

use super::state::{SessionState, clamp_chars};
use crate::event::EventBus;

/// Buffer size for the limiter's command mailbox.
const COMMAND_BUFFER: usize = 32;

enum Command {
    StartNewSession {
        reason: SessionStartReason,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    ValidateCharacters {
        count: usize,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    RegisterSubmission {
        reply: oneshot::Sender<SubmissionOutcome>,
    },
    EnterBackground {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    EnterForeground {
        reply: oneshot::Sender<bool>,
    },
    ScreenLocked {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Handle to the session limiter actor.
///
/// Cheap to clone. The actor stops when every handle is dropped or when the
/// cancellation token passed to [`SessionLimiter::spawn`] fires; after that
/// every async operation returns [`SessionError::Stopped`].
#[derive(Clone)]
pub struct SessionLimiter {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    limits: SessionLimits,
}

impl SessionLimiter {
    /// Start a new session and spawn the actor that owns it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(limits: SessionLimits, events: EventBus, cancel: CancellationToken) -> Self {
        let state = SessionState::new(limits.clone());
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

        info!(
            session_id = %state.session_id(),
            max_submissions = limits.max_submissions,
            "session started"
        );
        events.publish(CompanionEvent::SessionStarted {
            session_id: state.session_id(),
            reason: SessionStartReason::Launch,
        });

        let actor = LimiterActor {
            state,
            commands: command_rx,
            snapshots: snapshot_tx,
            events,
            cancel,
        };
        tokio::spawn(actor.run());

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            limits,
        }
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    /// Truncate `text` to the per-submission character cap.
    pub fn clamp_input(&self, text: &str) -> String {
        clamp_chars(text, self.limits.max_characters)
    }

    /// The most recently published snapshot, without a round trip.
    pub fn current(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Observe every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Replace the current session with a fresh one.
    pub async fn start_new_session(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::StartNewSession {
            reason: SessionStartReason::Manual,
            reply,
        })
        .await
    }

    /// Set or clear the character-limit helper text for an input length.
    pub async fn validate_characters(&self, count: usize) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::ValidateCharacters { count, reply })
            .await
    }

    /// Count one submission against the current session.
    pub async fn register_submission(&self) -> Result<SubmissionOutcome, SessionError> {
        self.request(|reply| Command::RegisterSubmission { reply })
            .await
    }

    /// Record that the app moved to the background.
    pub async fn enter_background(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::EnterBackground { reply }).await
    }

    /// Record a return to the foreground.
    ///
    /// Returns `true` if the time away crossed the reset threshold and a
    /// new session was started.
    pub async fn enter_foreground(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::EnterForeground { reply }).await
    }

    /// The screen was locked; always starts a new session.
    pub async fn screen_locked(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::ScreenLocked { reply }).await
    }

    /// Snapshot taken inside the actor, ordered after every earlier call.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(make(reply_tx))
            .await
            .map_err(|_| SessionError::Stopped)?;
        reply_rx.await.map_err(|_| SessionError::Stopped)
    }
}

impl std::fmt::Debug for SessionLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLimiter")
            .field("limits", &self.limits)
            .field("session_id", &self.snapshots.borrow().id)
            .finish()
    }
}

struct LimiterActor {
    state: SessionState,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: EventBus,
    cancel: CancellationToken,
}

impl LimiterActor {
    async fn run(mut self) {
        loop {
            let deadline = self.state.cooldown_deadline();

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("session limiter cancelled");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("all session limiter handles dropped");
                        break;
                    }
                },
                _ = wait_for(deadline) => {
                    if self.state.expire_cooldown(Instant::now()) {
                        self.session_started(SessionStartReason::CooldownExpired);
                        self.publish();
                    }
                }
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::StartNewSession { reason, reply } => {
                self.state.start_new_session();
                self.session_started(reason);
                self.publish();
                let _ = reply.send(self.state.snapshot());
            }
            Command::ValidateCharacters { count, reply } => {
                self.state.validate_characters(count);
                self.publish();
                let _ = reply.send(self.state.snapshot());
            }
            Command::RegisterSubmission { reply } => {
                let outcome = self.state.register_submission(Instant::now());
                match outcome {
                    SubmissionOutcome::Accepted { count } => {
                        debug!(session_id = %self.state.session_id(), count, "submission registered");
                    }
                    SubmissionOutcome::LimitReached { count } => {
                        info!(
                            session_id = %self.state.session_id(),
                            count,
                            cooldown_secs = self.state.limits().cooldown_secs,
                            "session limit reached, cooling down"
                        );
                        self.events.publish(CompanionEvent::SessionLimitReached {
                            session_id: self.state.session_id(),
                            count,
                        });
                    }
                    SubmissionOutcome::Rejected => {
                        debug!(session_id = %self.state.session_id(), "submission rejected while limited");
                    }
                }
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::EnterBackground { reply } => {
                self.state.enter_background(Instant::now());
                debug!(session_id = %self.state.session_id(), "entered background");
                let _ = reply.send(self.state.snapshot());
            }
            Command::EnterForeground { reply } => {
                let reset = self.state.enter_foreground(Instant::now());
                if reset {
                    self.session_started(SessionStartReason::BackgroundTimeout);
                    self.publish();
                }
                let _ = reply.send(reset);
            }
            Command::ScreenLocked { reply } => {
                self.state.screen_locked();
                self.session_started(SessionStartReason::ScreenLocked);
                self.publish();
                let _ = reply.send(self.state.snapshot());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
        }
    }

    fn session_started(&self, reason: SessionStartReason) {
        let session_id: Uuid = self.state.session_id();
        info!(%session_id, %reason, "session started");
        self.events
            .publish(CompanionEvent::SessionStarted { session_id, reason });
    }

    fn publish(&self) {
        let next = self.state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Resolve at `deadline`, or never when no cooldown is armed.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::broadcast;

    use nhoru_types::session::SessionPhase;

    fn limits(cooldown_secs: u64, background_reset_secs: u64) -> SessionLimits {
        SessionLimits {
            max_submissions: 10,
            max_characters: 100,
            cooldown_secs,
            background_reset_secs,
        }
    }

    fn spawn(limits: SessionLimits) -> (SessionLimiter, broadcast::Receiver<CompanionEvent>) {
        let events = EventBus::new(64);
        let rx = events.subscribe();
        let limiter = SessionLimiter::spawn(limits, events, CancellationToken::new());
        (limiter, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn ten_submissions_then_cooldown_restores_input() {
        let (limiter, _events) = spawn(limits(10, 5));

        for expected in 1..10 {
            assert_eq!(
                limiter.register_submission().await.unwrap(),
                SubmissionOutcome::Accepted { count: expected }
            );
        }
        assert_eq!(
            limiter.register_submission().await.unwrap(),
            SubmissionOutcome::LimitReached { count: 10 }
        );

        let limited = limiter.current();
        assert_eq!(limited.phase, SessionPhase::Limited);
        assert!(!limited.can_submit);
        assert!(limited.is_input_disabled);

        tokio::time::sleep(Duration::from_secs(11)).await;

        let restored = limiter.snapshot().await.unwrap();
        assert!(restored.can_submit);
        assert_eq!(restored.submission_count, 0);
        assert!(restored.system_message.is_empty());
        assert_ne!(restored.id, limited.id);
    }

    #[tokio::test(start_paused = true)]
    async fn submissions_while_limited_are_noops() {
        let (limiter, _events) = spawn(limits(10, 5));
        for _ in 0..10 {
            limiter.register_submission().await.unwrap();
        }
        for _ in 0..3 {
            assert_eq!(
                limiter.register_submission().await.unwrap(),
                SubmissionOutcome::Rejected
            );
        }
        assert_eq!(limiter.snapshot().await.unwrap().submission_count, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_does_not_fire_early() {
        let (limiter, _events) = spawn(limits(10, 5));
        for _ in 0..10 {
            limiter.register_submission().await.unwrap();
        }
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(
            limiter.snapshot().await.unwrap().phase,
            SessionPhase::Limited
        );
    }

    #[tokio::test(start_paused = true)]
    async fn manual_restart_cancels_pending_cooldown() {
        let (limiter, mut events) = spawn(limits(10, 5));
        for _ in 0..10 {
            limiter.register_submission().await.unwrap();
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        let fresh = limiter.start_new_session().await.unwrap();
        limiter.register_submission().await.unwrap();

        // The old deadline passes without touching the replacement session
        tokio::time::sleep(Duration::from_secs(10)).await;
        let snap = limiter.snapshot().await.unwrap();
        assert_eq!(snap.id, fresh.id);
        assert_eq!(snap.submission_count, 1);

        let mut reasons = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let CompanionEvent::SessionStarted { reason, .. } = event {
                reasons.push(reason);
            }
        }
        assert_eq!(
            reasons,
            vec![SessionStartReason::Launch, SessionStartReason::Manual]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn short_background_keeps_session() {
        let (limiter, _events) = spawn(limits(10, 5));
        limiter.register_submission().await.unwrap();
        let before = limiter.snapshot().await.unwrap();

        limiter.enter_background().await.unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!limiter.enter_foreground().await.unwrap());

        assert_eq!(limiter.snapshot().await.unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn long_background_resets_session() {
        let (limiter, _events) = spawn(limits(10, 5));
        limiter.register_submission().await.unwrap();
        let before = limiter.snapshot().await.unwrap();

        limiter.enter_background().await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(limiter.enter_foreground().await.unwrap());

        let after = limiter.snapshot().await.unwrap();
        assert_ne!(after.id, before.id);
        assert_eq!(after.submission_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn screen_lock_resets_limited_session() {
        let (limiter, mut events) = spawn(limits(10, 5));
        for _ in 0..10 {
            limiter.register_submission().await.unwrap();
        }

        let snap = limiter.screen_locked().await.unwrap();
        assert!(snap.can_submit);
        assert_eq!(snap.submission_count, 0);

        let mut saw_lock = false;
        while let Ok(event) = events.try_recv() {
            if let CompanionEvent::SessionStarted {
                reason: SessionStartReason::ScreenLocked,
                ..
            } = event
            {
                saw_lock = true;
            }
        }
        assert!(saw_lock);
    }

    #[tokio::test]
    async fn validate_characters_publishes_helper_text() {
        let (limiter, _events) = spawn(limits(10, 5));
        let mut watcher = limiter.subscribe();

        limiter.validate_characters(100).await.unwrap();
        assert!(watcher.has_changed().unwrap());
        assert_eq!(
            watcher.borrow_and_update().helper_text,
            "Character limit reached (100 max)"
        );

        limiter.validate_characters(3).await.unwrap();
        assert!(limiter.current().helper_text.is_empty());
    }

    #[tokio::test]
    async fn limit_reached_event_is_published() {
        let (limiter, mut events) = spawn(limits(10, 5));
        for _ in 0..10 {
            limiter.register_submission().await.unwrap();
        }

        let mut count = None;
        while let Ok(event) = events.try_recv() {
            if let CompanionEvent::SessionLimitReached { count: c, .. } = event {
                count = Some(c);
            }
        }
        assert_eq!(count, Some(10));
    }

    #[tokio::test]
    async fn cancelled_limiter_reports_stopped() {
        let cancel = CancellationToken::new();
        let limiter = SessionLimiter::spawn(limits(10, 5), EventBus::default(), cancel.clone());
        cancel.cancel();

        // Give the actor a chance to observe the cancellation
        tokio::task::yield_now().await;
        let mut result = limiter.snapshot().await;
        for _ in 0..10 {
            if result.is_err() {
                break;
            }
            tokio::task::yield_now().await;
            result = limiter.snapshot().await;
        }
        assert_eq!(result, Err(SessionError::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_cooldown_keeps_limiter_running() {
        let (limiter, _events) = spawn(SessionLimits {
            max_submissions: 1,
            ..limits(u64::MAX, 5)
        });

        assert_eq!(
            limiter.register_submission().await.unwrap(),
            SubmissionOutcome::LimitReached { count: 1 }
        );
        let limited = limiter.snapshot().await.unwrap();
        assert_eq!(limited.phase, SessionPhase::Limited);

        // A manual restart still gets through
        let restarted = limiter.start_new_session().await.unwrap();
        assert!(restarted.can_submit);
        assert_ne!(restarted.id, limited.id);
    }

    #[tokio::test]
    async fn clamp_input_uses_configured_cap() {
        let (limiter, _events) = spawn(SessionLimits {
            max_characters: 4,
            ..limits(10, 5)
        });
        assert_eq!(limiter.clamp_input("breathe"), "brea");
    }
}
