//! RapidAPI credential loading.
//!
//! The recognition API key is the one required external credential. It is
//! read from the `RAPIDAPI_KEY` environment variable, optionally sourced from
//! a local `RAPIDAPI_KEY.env` file. A missing or empty key is fatal at
//! startup; the interactive surface is never entered without it.

use anyhow::{anyhow, Result};

/// Environment variable holding the recognition API key.
pub const API_KEY_VAR: &str = "RAPIDAPI_KEY";

/// File sourced into the environment before the variable lookup.
pub const ENV_FILE: &str = "RAPIDAPI_KEY.env";

/// Loads the RapidAPI key from the environment.
///
/// A `RAPIDAPI_KEY.env` file in the working directory is sourced first if
/// present; variables already set in the process environment win. The key
/// value itself is never logged.
///
/// # Errors
/// - If the variable is unset or empty after sourcing the env file
pub fn load_api_key() -> Result<String> {
    if let Err(e) = dotenvy::from_filename(ENV_FILE) {
        if !e.not_found() {
            tracing::warn!("Could not read {ENV_FILE}: {e}");
        }
    }

    read_key_from_env(API_KEY_VAR)
}

fn read_key_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            tracing::info!("Loaded recognition API key from {var}");
            Ok(value)
        }
        _ => Err(anyhow!(
            "{var} not found in environment.\n\n\
             Set it in your shell or create a {ENV_FILE} file containing:\n\
             {var}=<your RapidAPI key>"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_key_is_returned() {
        std::env::set_var("TRACKDOWN_TEST_KEY_SET", "abc123");
        assert_eq!(read_key_from_env("TRACKDOWN_TEST_KEY_SET").unwrap(), "abc123");
    }

    #[test]
    fn missing_key_is_an_error() {
        std::env::remove_var("TRACKDOWN_TEST_KEY_MISSING");
        let err = read_key_from_env("TRACKDOWN_TEST_KEY_MISSING").unwrap_err();
        assert!(err.to_string().contains("TRACKDOWN_TEST_KEY_MISSING"));
    }

    #[test]
    fn empty_key_counts_as_missing() {
        std::env::set_var("TRACKDOWN_TEST_KEY_EMPTY", "   ");
        assert!(read_key_from_env("TRACKDOWN_TEST_KEY_EMPTY").is_err());
    }
}
