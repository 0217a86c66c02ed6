//! Session window limiting.
//!
//! - `state`: the pure Active/Limited state machine, driven by explicit
//!   instants so it can be tested without a clock.
//! - `limiter`: the actor that owns a `SessionState`, serializes every
//!   transition, and fires the cooldown.

pub mod limiter;
pub mod state;

pub use limiter::SessionLimiter;
pub use state::SessionState;
