//! API key lookup.
//!
//! - `env`: reads the bearer token from an environment variable

pub mod env;

pub use env::api_key_from_env;
