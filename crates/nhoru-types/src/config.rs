//! Global configuration types for nhoru.
//!
//! `NhoruConfig` represents the top-level `config.toml` that controls
//! session limits, the completion endpoint, and connectivity probing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::session::SessionLimits;

/// Top-level configuration.
///
/// Loaded from `~/.nhoru/config.toml`. Every table and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NhoruConfig {
    #[serde(default)]
    pub session: SessionLimits,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub connectivity: ConnectivityConfig,
}

/// How the retry-once flag is scoped across concurrent sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryScope {
    /// Each `send_message` call gets its own retry.
    #[default]
    PerRequest,
    /// One flag shared by every call. A failure from one message can
    /// consume the retry intended for another.
    Shared,
}

impl fmt::Display for RetryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryScope::PerRequest => write!(f, "per_request"),
            RetryScope::Shared => write!(f, "shared"),
        }
    }
}

/// Remote completion endpoint settings (`[assistant]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Upper bound on each attempt, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub retry_scope: RetryScope,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
            retry_scope: RetryScope::default(),
        }
    }
}

impl AssistantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reachability probing settings (`[connectivity]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    #[serde(default = "default_probe_port")]
    pub probe_port: u16,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

fn default_probe_host() -> String {
    "api.openai.com".to_string()
}

fn default_probe_port() -> u16 {
    443
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_probe_timeout_secs() -> u64 {
    3
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_host: default_probe_host(),
            probe_port: default_probe_port(),
            poll_interval_secs: default_poll_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl ConnectivityConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = NhoruConfig::default();
        assert_eq!(config.session.max_submissions, 10);
        assert_eq!(config.assistant.model, "gpt-4o-mini");
        assert_eq!(config.assistant.timeout(), Duration::from_secs(30));
        assert_eq!(config.assistant.retry_scope, RetryScope::PerRequest);
        assert_eq!(config.connectivity.probe_port, 443);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: NhoruConfig = toml::from_str("").unwrap();
        assert_eq!(config, NhoruConfig::default());
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
[session]
max_submissions = 5
cooldown_secs = 10

[assistant]
model = "gpt-4o"
retry_scope = "shared"

[connectivity]
poll_interval_secs = 0
"#;
        let config: NhoruConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session.max_submissions, 5);
        assert_eq!(config.session.cooldown_secs, 10);
        assert_eq!(config.session.max_characters, 100);
        assert_eq!(config.assistant.model, "gpt-4o");
        assert_eq!(config.assistant.retry_scope, RetryScope::Shared);
        assert_eq!(config.assistant.api_key_env, "OPENAI_API_KEY");
        // Zero is clamped so the monitor never spins.
        assert_eq!(config.connectivity.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_rejects_unknown_retry_scope() {
        let result: Result<NhoruConfig, _> =
            toml::from_str("[assistant]\nretry_scope = \"sometimes\"");
        assert!(result.is_err());
    }
}
