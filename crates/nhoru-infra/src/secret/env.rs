//! Environment variable secret lookup.
//!
//! The completion endpoint's bearer token is read from the variable named
//! by `[assistant].api_key_env` (default `OPENAI_API_KEY`) and wrapped in a
//! [`SecretString`] immediately, so it never appears in Debug output or
//! logs.

use secrecy::SecretString;

/// Read an API key from the environment variable `var`.
///
/// Returns `None` when the variable is unset, blank, or not valid Unicode.
/// Surrounding whitespace is trimmed.
pub fn api_key_from_env(var: &str) -> Option<SecretString> {
    match std::env::var(var) {
        Ok(value) => {
            let value = value.trim();
            if value.is_empty() {
                None
            } else {
                Some(SecretString::from(value.to_string()))
            }
        }
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(_)) => {
            tracing::warn!(var, "API key variable is not valid Unicode, ignoring");
            None
        }
    }
}
