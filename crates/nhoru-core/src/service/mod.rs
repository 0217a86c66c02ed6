//! Application services (use cases).
//!
//! Services orchestrate the limiter, dispatcher, and conversation. They
//! depend on the `CompletionProvider` port, never on a concrete backend.

pub mod companion;

pub use companion::{CompanionService, SubmitOutcome};
