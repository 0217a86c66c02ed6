//! Infrastructure layer for nhoru.
//!
//! Contains implementations of the ports defined in `nhoru-core`: the
//! OpenAI-compatible HTTP completion provider and the TCP reachability
//! probe. Also owns config loading, data directory resolution, and API
//! key lookup.

pub mod config;
pub mod connectivity;
pub mod filesystem;
pub mod llm;
pub mod secret;
