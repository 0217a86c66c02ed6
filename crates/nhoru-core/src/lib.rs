//! Business logic and port trait definitions for nhoru.
//!
//! This crate defines the "ports" (`CompletionProvider`,
//! `ReachabilityProbe`) that the infrastructure layer implements, plus the
//! session limiter, chat dispatcher, and the companion service that ties
//! them together. It depends only on `nhoru-types` -- never on
//! `nhoru-infra` or any network crate.

pub mod chat;
pub mod connectivity;
pub mod event;
pub mod llm;
pub mod service;
pub mod session;
