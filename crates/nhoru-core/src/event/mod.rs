//! Event bus for companion state changes.
//!
//! Provides an `EventBus` that distributes `CompanionEvent` messages to all
//! subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::EventBus;
