//! Companion service.
//!
//! Ties the session limiter, chat dispatcher, and conversation log into the
//! single `submit` entry point the UI calls. The limiter decides whether a
//! submission is allowed; the dispatcher delivers it.
//!
//! Submissions take turns: registration, the user exchange and its reply
//! happen under one async lock, so the conversation always reads in the
//! order the limiter counted the submissions.

use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tracing::debug;

use nhoru_types::chat::ChatExchange;
use nhoru_types::error::{ChatError, SessionError};
use nhoru_types::event::CompanionEvent;
use nhoru_types::session::{SessionSnapshot, SubmissionOutcome};

use crate::chat::{ChatDispatcher, Conversation};
use crate::event::EventBus;
use crate::llm::CompletionProvider;
use crate::session::SessionLimiter;

/// What happened to one call to [`CompanionService::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input. Nothing was counted or sent.
    Ignored,
    /// The network is unreachable. Nothing was counted or sent.
    Offline,
    /// The session is cooling down. Nothing was counted or sent.
    Limited,
    /// The assistant replied. `limit_reached` is set when this submission
    /// used the last slot of the session.
    Replied { reply: String, limit_reached: bool },
    /// Counted and sent, but not delivered. The user exchange stays in
    /// the conversation.
    Failed(ChatError),
}

/// Service behind the chat screen.
///
/// Generic over the completion provider so tests can script replies.
pub struct CompanionService<P: CompletionProvider> {
    limiter: SessionLimiter,
    dispatcher: Arc<ChatDispatcher<P>>,
    conversation: Mutex<Conversation>,
    /// Held for a whole submission, from registration to the reply.
    turn: AsyncMutex<()>,
    events: EventBus,
}

impl<P: CompletionProvider> CompanionService<P> {
    pub fn new(limiter: SessionLimiter, dispatcher: Arc<ChatDispatcher<P>>, events: EventBus) -> Self {
        Self {
            limiter,
            dispatcher,
            conversation: Mutex::new(Conversation::new()),
            turn: AsyncMutex::new(()),
            events,
        }
    }

    pub fn limiter(&self) -> &SessionLimiter {
        &self.limiter
    }

    pub fn dispatcher(&self) -> &Arc<ChatDispatcher<P>> {
        &self.dispatcher
    }

    /// Submit one message.
    ///
    /// 1. Blank input is ignored
    /// 2. Input is truncated to the character cap
    /// 3. Offline input is refused without consuming a submission
    /// 4. The limiter counts the submission, or refuses it while limited
    /// 5. The user exchange is recorded and the message dispatched
    ///
    /// Concurrent callers are served one at a time, in the order they reach
    /// the turn lock. Only a stopped limiter produces an `Err`.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        let text = self.limiter.clamp_input(trimmed);

        if !self.dispatcher.is_online() {
            debug!("submit refused, offline");
            return Ok(SubmitOutcome::Offline);
        }

        let _turn = self.turn.lock().await;
        let outcome = self.limiter.register_submission().await?;
        if outcome == SubmissionOutcome::Rejected {
            return Ok(SubmitOutcome::Limited);
        }
        let limit_reached = matches!(outcome, SubmissionOutcome::LimitReached { .. });
        let session_id = self.limiter.current().id;

        self.conversation
            .lock()
            .expect("conversation lock poisoned")
            .push(ChatExchange::user(text.clone()));
        self.events.publish(CompanionEvent::MessageSent {
            session_id,
            chars: text.chars().count(),
        });

        match self.dispatcher.send_message(&text).await {
            Ok(reply) => {
                self.conversation
                    .lock()
                    .expect("conversation lock poisoned")
                    .push(ChatExchange::assistant(reply.clone()));
                self.events.publish(CompanionEvent::ReplyReceived {
                    session_id,
                    chars: reply.chars().count(),
                });
                Ok(SubmitOutcome::Replied {
                    reply,
                    limit_reached,
                })
            }
            Err(err) => {
                self.events.publish(CompanionEvent::DeliveryFailed {
                    session_id,
                    reason: err.to_string(),
                });
                Ok(SubmitOutcome::Failed(err))
            }
        }
    }

    /// Every exchange so far, oldest first.
    pub fn history(&self) -> Vec<ChatExchange> {
        self.conversation
            .lock()
            .expect("conversation lock poisoned")
            .exchanges()
            .to_vec()
    }

    /// The latest published session snapshot.
    pub fn session(&self) -> SessionSnapshot {
        self.limiter.current()
    }

    pub async fn validate_characters(&self, count: usize) -> Result<SessionSnapshot, SessionError> {
        self.limiter.validate_characters(count).await
    }

    pub async fn enter_background(&self) -> Result<SessionSnapshot, SessionError> {
        self.limiter.enter_background().await
    }

    /// Returns `true` if the time away started a new session.
    pub async fn enter_foreground(&self) -> Result<bool, SessionError> {
        self.limiter.enter_foreground().await
    }

    pub async fn screen_locked(&self) -> Result<SessionSnapshot, SessionError> {
        self.limiter.screen_locked().await
    }

    /// Start a new session on request.
    pub async fn restart(&self) -> Result<SessionSnapshot, SessionError> {
        self.limiter.start_new_session().await
    }

    pub fn advisory(&self) -> Option<&'static str> {
        self.dispatcher.advisory()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CompanionEvent> {
        self.events.subscribe()
    }
}
