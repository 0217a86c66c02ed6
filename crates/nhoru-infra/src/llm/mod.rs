//! Completion provider implementations.
//!
//! - `openai_compat`: any endpoint speaking the OpenAI chat-completions
//!   wire format

pub mod openai_compat;

pub use openai_compat::OpenAiCompatibleProvider;
