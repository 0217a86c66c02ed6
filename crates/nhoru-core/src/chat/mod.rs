//! Conversation state and message delivery.
//!
//! - `Conversation`: append-only, in-memory exchange list
//! - `RetryGate`: the retry-once policy, per request or shared
//! - `ChatDispatcher`: connectivity-gated, retry-once completion calls
//! - `persona`: the fixed system instruction and intro lines

pub mod conversation;
pub mod dispatcher;
pub mod persona;
pub mod retry;

pub use conversation::Conversation;
pub use dispatcher::{ChatDispatcher, DispatcherSettings};
pub use retry::{RetryDecision, RetryGate, RetryTicket};
