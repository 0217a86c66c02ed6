//! Connectivity-gated message delivery with a single retry.
//!
//! `ChatDispatcher` wraps a [`CompletionProvider`] with:
//! - an online check before any network work
//! - a per-attempt timeout
//! - the retry-once policy from [`RetryGate`]
//! - a user-facing advisory line, published on a `watch` channel
//!
//! Attempt-level errors are logged here and never returned. Callers only
//! ever see [`ChatError`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nhoru_types::config::{AssistantConfig, RetryScope};
use nhoru_types::error::{ChatError, OFFLINE_NOTICE, UNDELIVERED_NOTICE};
use nhoru_types::event::CompanionEvent;
use nhoru_types::llm::{CompletionRequest, LlmError, Message};

use super::persona::SYSTEM_PROMPT;
use super::retry::{RetryDecision, RetryGate};
use crate::connectivity::Connectivity;
use crate::event::EventBus;
use crate::llm::CompletionProvider;

/// Request and retry settings for a dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherSettings {
    pub model: String,
    pub temperature: f64,
    pub attempt_timeout: Duration,
    pub retry_scope: RetryScope,
}

impl From<&AssistantConfig> for DispatcherSettings {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            attempt_timeout: config.timeout(),
            retry_scope: config.retry_scope,
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::from(&AssistantConfig::default())
    }
}

pub struct ChatDispatcher<P> {
    provider: P,
    connectivity: Connectivity,
    settings: DispatcherSettings,
    retry: RetryGate,
    advisory: watch::Sender<Option<&'static str>>,
}

impl<P: CompletionProvider> ChatDispatcher<P> {
    pub fn new(provider: P, connectivity: Connectivity, settings: DispatcherSettings) -> Self {
        let retry = RetryGate::new(settings.retry_scope);
        let initial = (!connectivity.is_online()).then_some(OFFLINE_NOTICE);
        let (advisory, _rx) = watch::channel(initial);
        Self {
            provider,
            connectivity,
            settings,
            retry,
            advisory,
        }
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// The line currently shown under the input, if any.
    pub fn advisory(&self) -> Option<&'static str> {
        *self.advisory.borrow()
    }

    pub fn subscribe_advisory(&self) -> watch::Receiver<Option<&'static str>> {
        self.advisory.subscribe()
    }

    /// The request sent for `text`: persona instruction, then the user text.
    pub fn build_request(&self, text: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(text)],
            temperature: self.settings.temperature,
        }
    }

    /// Deliver `text` and return the assistant's reply.
    ///
    /// Fails immediately with [`ChatError::NoConnectivity`] while offline.
    /// Otherwise a failed attempt is retried once; a second failure yields
    /// [`ChatError::Undelivered`] and sets the delivery advisory.
    pub async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        if !self.connectivity.is_online() {
            debug!("send skipped, offline");
            return Err(ChatError::NoConnectivity);
        }

        let request = self.build_request(text);
        let mut ticket = self.retry.ticket();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.attempt(&request).await {
                Ok(reply) => {
                    ticket.on_success();
                    self.clear_advisory(UNDELIVERED_NOTICE);
                    debug!(
                        provider = self.provider.name(),
                        attempt,
                        chars = reply.chars().count(),
                        "reply received"
                    );
                    return Ok(reply);
                }
                Err(err) => {
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        error = %err,
                        "completion attempt failed"
                    );
                    match ticket.on_failure() {
                        RetryDecision::Retry => continue,
                        RetryDecision::GiveUp => {
                            self.set_advisory(UNDELIVERED_NOTICE);
                            return Err(ChatError::Undelivered { attempts: attempt });
                        }
                    }
                }
            }
        }
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let response = tokio::time::timeout(
            self.settings.attempt_timeout,
            self.provider.complete(request),
        )
        .await
        .map_err(|_| LlmError::Timeout)??;

        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyReply);
        }
        Ok(response.content)
    }

    fn set_advisory(&self, notice: &'static str) {
        self.advisory.send_if_modified(|current| {
            if *current == Some(notice) {
                false
            } else {
                *current = Some(notice);
                true
            }
        });
    }

    /// Clear the advisory only if it currently shows `notice`.
    fn clear_advisory(&self, notice: &'static str) {
        self.advisory.send_if_modified(|current| {
            if *current == Some(notice) {
                *current = None;
                true
            } else {
                false
            }
        });
    }

    fn apply_connectivity(&self, online: bool) {
        if online {
            self.advisory.send_if_modified(|current| {
                let changed = current.is_some();
                *current = None;
                changed
            });
        } else {
            self.set_advisory(OFFLINE_NOTICE);
        }
    }
}

impl<P: CompletionProvider + 'static> ChatDispatcher<P> {
    /// Spawn a task that mirrors connectivity into the advisory and
    /// publishes [`CompanionEvent::ConnectivityChanged`] on every change.
    pub fn watch_connectivity(
        self: &Arc<Self>,
        events: EventBus,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        let mut rx = dispatcher.connectivity.subscribe();
        let initial = *rx.borrow_and_update();
        dispatcher.apply_connectivity(initial);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let online = *rx.borrow_and_update();
                        info!(online, "connectivity changed");
                        dispatcher.apply_connectivity(online);
                        events.publish(CompanionEvent::ConnectivityChanged { online });
                    }
                }
            }
            debug!("connectivity watcher stopped");
        })
    }
}

impl<P> std::fmt::Debug for ChatDispatcher<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatDispatcher")
            .field("settings", &self.settings)
            .field("online", &self.connectivity.is_online())
            .finish_non_exhaustive()
    }
}
