//! Scripted provider for dispatcher and service tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use nhoru_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::CompletionProvider;

/// One scripted attempt result.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(&'static str),
    Fail(LlmError),
    /// Never completes; only a timeout ends the attempt.
    Hang,
}

/// Plays back a fixed list of steps, one per `complete` call. Once the
/// script runs out every call fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::Fail(LlmError::Transport("script exhausted".into())));

        match step {
            Step::Reply(text) => Ok(CompletionResponse {
                content: text.to_string(),
                model: Some(request.model.clone()),
            }),
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
        }
    }
}
