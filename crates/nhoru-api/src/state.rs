//! Application state wiring all services together.
//!
//! AppState holds the loaded config and the shared handles (connectivity
//! flag, event bus, shutdown token). `start_companion` pins the generic
//! core services to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use nhoru_core::chat::{ChatDispatcher, DispatcherSettings};
use nhoru_core::connectivity::{Connectivity, ConnectivityMonitor};
use nhoru_core::event::EventBus;
use nhoru_core::service::CompanionService;
use nhoru_core::session::SessionLimiter;
use nhoru_infra::config::{config_path, load_config};
use nhoru_infra::connectivity::TcpProbe;
use nhoru_infra::filesystem::resolve_data_dir;
use nhoru_infra::llm::OpenAiCompatibleProvider;
use nhoru_infra::secret::api_key_from_env;
use nhoru_types::config::NhoruConfig;
use nhoru_types::event::CompanionEvent;

/// Companion service pinned to the HTTP provider.
pub type ConcreteCompanionService = CompanionService<OpenAiCompatibleProvider>;

/// Shared application state.
pub struct AppState {
    pub data_dir: PathBuf,
    pub config: NhoruConfig,
    pub connectivity: Connectivity,
    pub events: EventBus,
    pub cancel: CancellationToken,
}

impl AppState {
    /// Resolve the data directory and load `config.toml`.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_config(&data_dir).await;
        debug!(data_dir = %data_dir.display(), "configuration loaded");

        Ok(Self {
            data_dir,
            config,
            connectivity: Connectivity::default(),
            events: EventBus::default(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn config_path(&self) -> PathBuf {
        config_path(&self.data_dir)
    }

    /// The bearer token, if the configured environment variable is set.
    pub fn api_key(&self) -> Option<SecretString> {
        api_key_from_env(&self.config.assistant.api_key_env)
    }

    pub fn probe(&self) -> TcpProbe {
        TcpProbe::from(&self.config.connectivity)
    }

    /// Build the companion service and start its background tasks: the
    /// session limiter, the connectivity monitor, the advisory watcher,
    /// and the event logger. All of them stop on [`AppState::shutdown`].
    pub fn start_companion(&self) -> anyhow::Result<Arc<ConcreteCompanionService>> {
        let api_key = self.api_key().ok_or_else(|| {
            anyhow::anyhow!(
                "{} is not set. Export it before starting a chat.",
                self.config.assistant.api_key_env
            )
        })?;
        let provider = OpenAiCompatibleProvider::new(api_key, &self.config.assistant)?;

        spawn_event_logger(&self.events, self.cancel.child_token());

        let dispatcher = Arc::new(ChatDispatcher::new(
            provider,
            self.connectivity.clone(),
            DispatcherSettings::from(&self.config.assistant),
        ));
        dispatcher.watch_connectivity(self.events.clone(), self.cancel.child_token());

        ConnectivityMonitor::spawn(
            self.probe(),
            self.connectivity.clone(),
            self.config.connectivity.poll_interval(),
            self.cancel.child_token(),
        );

        let limiter = SessionLimiter::spawn(
            self.config.session.clone(),
            self.events.clone(),
            self.cancel.child_token(),
        );

        info!(
            endpoint = %self.config.assistant.endpoint,
            model = %self.config.assistant.model,
            retry_scope = %self.config.assistant.retry_scope,
            "companion started"
        );

        Ok(Arc::new(CompanionService::new(
            limiter,
            dispatcher,
            self.events.clone(),
        )))
    }

    /// Stop every background task started by `start_companion`.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Log every companion event at debug level.
fn spawn_event_logger(events: &EventBus, cancel: CancellationToken) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "event logger lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    });
}

fn log_event(event: &CompanionEvent) {
    match event {
        CompanionEvent::SessionStarted { session_id, reason } => {
            info!(%session_id, %reason, "event: session started");
        }
        CompanionEvent::SessionLimitReached { session_id, count } => {
            info!(%session_id, count, "event: session limit reached");
        }
        CompanionEvent::MessageSent { session_id, chars } => {
            debug!(%session_id, chars, "event: message sent");
        }
        CompanionEvent::ReplyReceived { session_id, chars } => {
            debug!(%session_id, chars, "event: reply received");
        }
        CompanionEvent::DeliveryFailed { session_id, reason } => {
            info!(%session_id, %reason, "event: delivery failed");
        }
        CompanionEvent::ConnectivityChanged { online } => {
            info!(online, "event: connectivity changed");
        }
    }
}
