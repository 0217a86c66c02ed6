//! CompletionProvider trait definition.

use nhoru_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// A backend that turns a [`CompletionRequest`] into a reply.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). One call is
/// one attempt: retries and timeouts are the dispatcher's business, not the
/// provider's.
///
/// An implementation must return `Ok` only when it extracted a reply; a
/// 2xx response without one is [`LlmError::Malformed`] or
/// [`LlmError::EmptyReply`].
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;

    /// Send one completion request and wait for the full reply.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
