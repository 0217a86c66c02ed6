//! Data directory resolution.

use std::path::PathBuf;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "NHORU_DATA_DIR";

/// Resolve the nhoru data directory.
///
/// Priority:
/// 1. `NHORU_DATA_DIR` environment variable
/// 2. `~/.nhoru`
/// 3. `./.nhoru` when no home directory is known
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".nhoru");
    }

    PathBuf::from(".nhoru")
}
