//! Configuration loader for nhoru.
//!
//! Reads `config.toml` from the data directory (`~/.nhoru/` in production)
//! and deserializes it into [`NhoruConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use nhoru_types::config::NhoruConfig;

/// File name of the config inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`NhoruConfig::default()`].
/// - If the file cannot be read or parsed, logs a warning and returns the
///   default.
/// - Otherwise returns the parsed config. Missing fields take defaults.
pub async fn load_config(data_dir: &Path) -> NhoruConfig {
    let path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return NhoruConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return NhoruConfig::default();
        }
    };

    match toml::from_str::<NhoruConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                path.display()
            );
            NhoruConfig::default()
        }
    }
}
