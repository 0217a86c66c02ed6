//! Shared domain types for the nhoru companion.
//!
//! This crate contains the types shared by every layer: session snapshots,
//! chat exchanges, completion request shapes, configuration, events, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod session;
