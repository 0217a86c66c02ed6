//! In-memory conversation log.

use nhoru_types::chat::ChatExchange;

/// Ordered list of exchanges for the lifetime of the process.
///
/// Exchanges are only ever appended. Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    exchanges: Vec<ChatExchange>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, exchange: ChatExchange) {
        self.exchanges.push(exchange);
    }

    pub fn exchanges(&self) -> &[ChatExchange] {
        &self.exchanges
    }
}
