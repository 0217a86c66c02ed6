//! Completion provider port.
//!
//! `CompletionProvider` is the seam between the chat dispatcher and the
//! remote model. The HTTP implementation lives in `nhoru-infra`.

pub mod provider;

#[cfg(test)]
pub(crate) mod testing;

pub use provider::CompletionProvider;
